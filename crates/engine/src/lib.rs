#![deny(unsafe_code)]
//! Interaction engine for a single chat-message bubble.
//!
//! Raw pointer input goes in; reaction and reply intents come out through the
//! registered handlers. The engine never mutates the message snapshot it renders.

pub mod attachment;
pub mod bubble;
pub mod config;
pub mod error;
/// Input events and outgoing intent contracts.
pub mod events;
pub mod gesture;
pub mod message;
pub mod picker;
/// Host seam for timers and document listeners.
pub mod platform;
pub mod press;
pub mod reaction;
/// Pure derivation of what a bubble displays.
pub mod render;
pub mod runtime;
pub mod simulation;
pub mod spring;

pub use attachment::{AttachmentRender, AttachmentResolver, resolve_attachment};
pub use bubble::MessageBubble;
pub use config::{BubbleConfig, DEFAULT_REACTIONS, SpringConfig};
pub use error::{ConfigError, ConfigResult, SnapshotError, SnapshotResult};
pub use events::{
    BubbleEvent, BubbleHandlers, BubbleIntent, ContextMenuOutcome, PointerButton,
    ReactionAction, ReactionToggled, ReplyRequest,
};
pub use gesture::{GestureRecognizer, GestureState, Point};
pub use message::{
    Attachment, AttachmentSource, DeliveryStatus, DisplayMessage, MessageId, MessageReaction,
    ReplyToInfo,
};
pub use picker::{CloseReason, OpenTrigger, PickerModel, PickerState};
pub use platform::{LoopPlatform, Platform, TimerHandle};
pub use press::Rect;
pub use render::{BubbleView, ReactionBadge, ReadReceipt, ReplyPreview};
pub use runtime::BubbleRuntime;
pub use simulation::{IntentLog, ScheduledEvent, Simulation};
