use serde::{Deserialize, Serialize};

use crate::gesture::Point;
use crate::message::{DisplayMessage, MessageId};
use crate::press::Rect;

/// Which control produced a pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Touch,
}

impl PointerButton {
    /// Primary mouse buttons and touches activate; secondary clicks do not.
    pub fn is_activation(self) -> bool {
        matches!(self, Self::Primary | Self::Touch)
    }
}

/// Raw input delivered to one bubble by its host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BubbleEvent {
    /// Pointer or touch pressed on the bubble.
    PointerDown {
        #[serde(flatten)]
        at: Point,
        #[serde(default)]
        button: PointerButton,
    },
    PointerMove {
        #[serde(flatten)]
        at: Point,
    },
    PointerUp,
    /// Touch cancelled or pointer capture lost.
    PointerCancel,
    /// Right click or the platform's context-menu gesture on the bubble.
    ContextMenu,
    /// Pointer-down anywhere in the document, forwarded while a listener is registered.
    DocumentPointerDown {
        #[serde(flatten)]
        at: Point,
        #[serde(default)]
        button: PointerButton,
    },
    SelectReaction {
        emoji: String,
    },
    SelectReply,
    /// Layout reported the bubble's bounds in document coordinates.
    Layout {
        bounds: Rect,
    },
    /// A new snapshot for the same bubble.
    Render {
        message: DisplayMessage,
    },
}

/// Outcome of a secondary activation, reported back to the host synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextMenuOutcome {
    /// The host must suppress its native context menu when set.
    pub default_prevented: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionAction {
    Added,
    Removed,
}

/// Emitted when the viewer picks a reaction; upstream decides how to persist it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionToggled {
    pub message_id: MessageId,
    pub emoji: String,
    pub action: ReactionAction,
}

/// Emitted when the viewer asks to reply to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub id: MessageId,
    pub content: String,
    pub is_own: bool,
}

impl ReplyRequest {
    pub fn for_message(message: &DisplayMessage) -> Self {
        Self {
            id: message.id.clone(),
            content: message.content.clone(),
            is_own: message.is_own,
        }
    }
}

/// Any intent leaving the bubble, used by drivers that record output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "camelCase")]
pub enum BubbleIntent {
    React(ReactionToggled),
    Reply(ReplyRequest),
}

pub type ReactHandler = Box<dyn FnMut(ReactionToggled)>;
pub type ReplyHandler = Box<dyn FnMut(ReplyRequest)>;

/// Optional intent sinks. A missing handler disables its affordance.
#[derive(Default)]
pub struct BubbleHandlers {
    pub on_react: Option<ReactHandler>,
    pub on_reply: Option<ReplyHandler>,
}

impl BubbleHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_react(mut self, handler: impl FnMut(ReactionToggled) + 'static) -> Self {
        self.on_react = Some(Box::new(handler));
        self
    }

    pub fn on_reply(mut self, handler: impl FnMut(ReplyRequest) + 'static) -> Self {
        self.on_reply = Some(Box::new(handler));
        self
    }

    pub fn can_react(&self) -> bool {
        self.on_react.is_some()
    }

    pub fn can_reply(&self) -> bool {
        self.on_reply.is_some()
    }
}

impl std::fmt::Debug for BubbleHandlers {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("BubbleHandlers")
            .field("on_react", &self.can_react())
            .field("on_reply", &self.can_reply())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_deserialize_from_tagged_json() {
        let down: BubbleEvent =
            serde_json::from_str(r#"{ "type": "pointerDown", "x": 4, "y": 2, "button": "touch" }"#)
                .expect("pointer down");
        assert_eq!(
            down,
            BubbleEvent::PointerDown {
                at: Point::new(4.0, 2.0),
                button: PointerButton::Touch,
            }
        );

        let select: BubbleEvent =
            serde_json::from_str(r#"{ "type": "selectReaction", "emoji": "👍" }"#)
                .expect("select reaction");
        assert_eq!(
            select,
            BubbleEvent::SelectReaction {
                emoji: "👍".into()
            }
        );
    }

    #[test]
    fn pointer_button_defaults_to_primary() {
        let event: BubbleEvent =
            serde_json::from_str(r#"{ "type": "documentPointerDown", "x": 1, "y": 1 }"#)
                .expect("document pointer down");
        assert!(matches!(
            event,
            BubbleEvent::DocumentPointerDown {
                button: PointerButton::Primary,
                ..
            }
        ));
        assert!(!PointerButton::Secondary.is_activation());
    }

    #[test]
    fn intents_serialize_with_camel_case_fields() {
        let intent = BubbleIntent::React(ReactionToggled {
            message_id: MessageId::new("m1"),
            emoji: "👍".into(),
            action: ReactionAction::Added,
        });
        let json = serde_json::to_value(&intent).expect("serializable");
        assert_eq!(json["intent"], "react");
        assert_eq!(json["messageId"], "m1");
        assert_eq!(json["action"], "added");
    }
}
