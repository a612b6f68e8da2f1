use crate::events::{ReactionAction, ReactionToggled};
use crate::message::{MessageId, MessageReaction};

/// Decides whether picking `emoji` adds or removes the viewer's reaction.
///
/// Only an existing entry the viewer already reacted with is removed; anything
/// else, including an emoji absent from the list, is an add.
pub fn decide_action(emoji: &str, reactions: &[MessageReaction]) -> ReactionAction {
    match reactions.iter().find(|reaction| reaction.emoji == emoji) {
        Some(reaction) if reaction.has_reacted => ReactionAction::Removed,
        Some(_) | None => ReactionAction::Added,
    }
}

/// Builds the intent for one reaction pick. The list itself is never touched.
pub fn toggle(message_id: &MessageId, emoji: &str, reactions: &[MessageReaction]) -> ReactionToggled {
    ReactionToggled {
        message_id: message_id.clone(),
        emoji: emoji.to_string(),
        action: decide_action(emoji, reactions),
    }
}

/// Reference reducer for the upstream owner of the reaction list.
///
/// Removing keeps a zero-count entry in place; rendering filters it out.
pub fn apply_toggle(reactions: &[MessageReaction], toggled: &ReactionToggled) -> Vec<MessageReaction> {
    let mut next = reactions.to_vec();
    let existing = next
        .iter_mut()
        .find(|reaction| reaction.emoji == toggled.emoji);

    match (toggled.action, existing) {
        (ReactionAction::Added, Some(reaction)) => {
            if !reaction.has_reacted {
                reaction.count = reaction.count.saturating_add(1);
                reaction.has_reacted = true;
            }
        }
        (ReactionAction::Added, None) => {
            next.push(MessageReaction::new(toggled.emoji.clone(), 1, true));
        }
        (ReactionAction::Removed, Some(reaction)) => {
            if reaction.has_reacted {
                reaction.count = reaction.count.saturating_sub(1);
                reaction.has_reacted = false;
            }
        }
        (ReactionAction::Removed, None) => {}
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> MessageId {
        MessageId::new("m1")
    }

    #[test]
    fn unreacted_existing_emoji_is_added() {
        let reactions = vec![MessageReaction::new("👍", 2, false)];
        let toggled = toggle(&id(), "👍", &reactions);
        assert_eq!(toggled.action, ReactionAction::Added);

        let next = apply_toggle(&reactions, &toggled);
        assert_eq!(next, vec![MessageReaction::new("👍", 3, true)]);
    }

    #[test]
    fn reacted_emoji_is_removed() {
        let reactions = vec![MessageReaction::new("❤️", 1, true)];
        assert_eq!(decide_action("❤️", &reactions), ReactionAction::Removed);

        let next = apply_toggle(&reactions, &toggle(&id(), "❤️", &reactions));
        assert_eq!(next, vec![MessageReaction::new("❤️", 0, false)]);
    }

    #[test]
    fn absent_emoji_is_added_at_the_end() {
        let reactions = vec![MessageReaction::new("👍", 1, false)];
        let next = apply_toggle(&reactions, &toggle(&id(), "😂", &reactions));
        assert_eq!(
            next,
            vec![
                MessageReaction::new("👍", 1, false),
                MessageReaction::new("😂", 1, true),
            ]
        );
    }

    #[test]
    fn match_is_exact_not_prefix() {
        // Heart without the variation selector is a different key.
        let reactions = vec![MessageReaction::new("❤️", 4, true)];
        assert_eq!(decide_action("❤", &reactions), ReactionAction::Added);
    }

    #[test]
    fn toggling_twice_restores_viewer_state() {
        let bases = [
            vec![],
            vec![MessageReaction::new("👍", 2, false)],
            vec![MessageReaction::new("👍", 2, true)],
            vec![
                MessageReaction::new("😮", 0, false),
                MessageReaction::new("👍", 7, true),
            ],
        ];

        for base in bases {
            for emoji in ["👍", "😮"] {
                let first = toggle(&id(), emoji, &base);
                let after_first = apply_toggle(&base, &first);
                let second = toggle(&id(), emoji, &after_first);
                let after_second = apply_toggle(&after_first, &second);

                assert_ne!(first.action, second.action);
                let viewer_state = |list: &[MessageReaction]| {
                    list.iter()
                        .find(|reaction| reaction.emoji == emoji)
                        .is_some_and(|reaction| reaction.has_reacted)
                };
                assert_eq!(viewer_state(&base), viewer_state(&after_second));
            }
        }
    }
}
