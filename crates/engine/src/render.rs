use serde::Serialize;

use crate::attachment::AttachmentRender;
use crate::gesture::GestureState;
use crate::message::{DeliveryStatus, DisplayMessage, MessageId, MessageReaction};
use crate::picker::PickerModel;

/// Read-receipt mark shown on own messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadReceipt {
    Single,
    Double,
}

impl ReadReceipt {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Single => "✓",
            Self::Double => "✓✓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPreview {
    pub id: MessageId,
    pub text: String,
    pub is_own: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionBadge {
    pub emoji: String,
    pub count: u32,
    pub highlighted: bool,
}

/// Everything a presentation layer needs to draw one bubble.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleView {
    pub id: MessageId,
    pub is_own: bool,
    pub time: String,
    pub text: Option<String>,
    pub reply_preview: Option<ReplyPreview>,
    pub attachment: Option<AttachmentRender>,
    pub reactions: Vec<ReactionBadge>,
    pub receipt: Option<ReadReceipt>,
    pub picker: Option<PickerModel>,
    pub gesture: GestureState,
}

/// Badges with a positive count, in their original order.
pub fn visible_reactions(reactions: &[MessageReaction]) -> Vec<ReactionBadge> {
    reactions
        .iter()
        .filter(|reaction| reaction.count > 0)
        .map(|reaction| ReactionBadge {
            emoji: reaction.emoji.clone(),
            count: reaction.count,
            highlighted: reaction.has_reacted,
        })
        .collect()
}

pub fn read_receipt(message: &DisplayMessage) -> Option<ReadReceipt> {
    if !message.is_own {
        return None;
    }

    match message.status {
        DeliveryStatus::Delivered => Some(ReadReceipt::Single),
        DeliveryStatus::Read => Some(ReadReceipt::Double),
        DeliveryStatus::None | DeliveryStatus::Sent => None,
    }
}

/// Reply preview text is shown as given; the caller already truncated it.
pub fn reply_preview(message: &DisplayMessage) -> Option<ReplyPreview> {
    message.reply_to.as_ref().map(|reply| ReplyPreview {
        id: reply.id.clone(),
        text: reply.content.clone(),
        is_own: reply.is_own,
    })
}

/// Blank or whitespace-only content renders no text block.
pub fn text_block(message: &DisplayMessage) -> Option<String> {
    if message.content.trim().is_empty() {
        None
    } else {
        Some(message.content.clone())
    }
}

/// Derives the view for a snapshot. Attachment resolution is passed in so callers
/// can memoize it.
pub fn derive_view(
    message: &DisplayMessage,
    attachment: Option<AttachmentRender>,
    picker: Option<PickerModel>,
    gesture: GestureState,
) -> BubbleView {
    BubbleView {
        id: message.id.clone(),
        is_own: message.is_own,
        time: message.time.clone(),
        text: text_block(message),
        reply_preview: reply_preview(message),
        attachment,
        reactions: visible_reactions(&message.reactions),
        receipt: read_receipt(message),
        picker,
        gesture,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::resolve_attachment;
    use crate::message::{Attachment, ReplyToInfo};

    #[test]
    fn zero_count_reactions_are_hidden_and_order_kept() {
        let reactions = vec![
            MessageReaction::new("😂", 3, false),
            MessageReaction::new("👍", 0, false),
            MessageReaction::new("❤️", 1, true),
        ];

        let badges = visible_reactions(&reactions);
        assert!(badges.iter().all(|badge| badge.count > 0));
        assert_eq!(
            badges.iter().map(|badge| badge.emoji.as_str()).collect::<Vec<_>>(),
            vec!["😂", "❤️"]
        );
        assert!(badges[1].highlighted);
    }

    #[test]
    fn receipts_only_on_own_messages() {
        let cases = [
            (true, DeliveryStatus::None, None),
            (true, DeliveryStatus::Sent, None),
            (true, DeliveryStatus::Delivered, Some(ReadReceipt::Single)),
            (true, DeliveryStatus::Read, Some(ReadReceipt::Double)),
            (false, DeliveryStatus::Read, None),
            (false, DeliveryStatus::Delivered, None),
        ];

        for (is_own, status, expected) in cases {
            let message = DisplayMessage::new("m1", "hi", is_own).with_status(status);
            assert_eq!(read_receipt(&message), expected, "{is_own} {status:?}");
        }
        assert_eq!(ReadReceipt::Double.glyph(), "✓✓");
    }

    #[test]
    fn whitespace_content_suppresses_text_but_keeps_attachment() {
        let attachment = Attachment::with_data("doc.pdf", "application/pdf", vec![1, 2]);
        let message = DisplayMessage::new("m1", "  \n\t", false).with_attachment(attachment.clone());

        let view = derive_view(
            &message,
            Some(resolve_attachment(&attachment)),
            None,
            GestureState::default(),
        );
        assert_eq!(view.text, None);
        assert!(matches!(view.attachment, Some(AttachmentRender::File { .. })));
    }

    #[test]
    fn reply_preview_is_not_retruncated() {
        let long = "x".repeat(500);
        let message = DisplayMessage::new("m2", "answer", false).with_reply_to(ReplyToInfo {
            id: MessageId::new("m1"),
            content: long.clone(),
            is_own: true,
        });

        let preview = reply_preview(&message).expect("preview present");
        assert_eq!(preview.text, long);
        assert!(preview.is_own);
    }
}
