use serde::Serialize;

/// What opened the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OpenTrigger {
    LongPress,
    SecondaryActivation,
}

/// Why the picker closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseReason {
    OutsideInteraction,
    EmojiSelected,
    ReplySelected,
    Unmount,
}

/// Open/closed state of the combined reaction and reply overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickerState {
    #[default]
    Closed,
    Open(OpenTrigger),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerTransition {
    Open(OpenTrigger),
    Close(CloseReason),
}

/// Rejection reason for transitions that do not apply to the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerTransitionRejection {
    NotOpen(CloseReason),
}

pub type PickerTransitionResult = Result<PickerState, PickerTransitionRejection>;

impl PickerState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// Applies one transition deterministically.
    ///
    /// Opening is idempotent: an open picker keeps its original trigger. Closing
    /// requires an open picker.
    pub fn apply(&self, transition: PickerTransition) -> PickerTransitionResult {
        match transition {
            PickerTransition::Open(trigger) => match self {
                Self::Open(_) => Ok(*self),
                Self::Closed => Ok(Self::Open(trigger)),
            },
            PickerTransition::Close(reason) => match self {
                Self::Open(_) => Ok(Self::Closed),
                Self::Closed => Err(PickerTransitionRejection::NotOpen(reason)),
            },
        }
    }
}

/// Contents of the open picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerModel {
    /// Catalog in display order; empty when no reaction handler is registered.
    pub emojis: Vec<String>,
    /// Omitted when no reply handler is registered.
    pub show_reply: bool,
}
