use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DuplicateReactionSnafu, InconsistentReactionSnafu, SnapshotResult};

/// Stable identifier for one chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Creates a typed message identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Delivery status reported by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    None,
    Sent,
    Delivered,
    Read,
}

/// One aggregated reaction badge on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReaction {
    pub emoji: String,
    pub count: u32,
    /// Whether the local viewer is included in `count`.
    #[serde(default)]
    pub has_reacted: bool,
}

impl MessageReaction {
    pub fn new(emoji: impl Into<String>, count: u32, has_reacted: bool) -> Self {
        Self {
            emoji: emoji.into(),
            count,
            has_reacted,
        }
    }

    /// A reaction the viewer is part of must be counted at least once.
    pub fn is_consistent(&self) -> bool {
        !self.has_reacted || self.count >= 1
    }
}

/// Preview snapshot of the message being replied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyToInfo {
    pub id: MessageId,
    /// Already truncated by the caller.
    pub content: String,
    pub is_own: bool,
}

/// Where the attachment payload lives. Exactly one of the two is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentSource {
    Data(Vec<u8>),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    #[serde(flatten)]
    pub source: AttachmentSource,
}

impl Attachment {
    pub fn with_data(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            source: AttachmentSource::Data(data.into()),
        }
    }

    pub fn with_url(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            source: AttachmentSource::Url(url.into()),
        }
    }

    /// Returns raw bytes when the payload was delivered inline and is non-empty.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.source {
            AttachmentSource::Data(bytes) if !bytes.is_empty() => Some(bytes),
            AttachmentSource::Data(_) | AttachmentSource::Url(_) => None,
        }
    }
}

/// Immutable message snapshot rendered by one bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMessage {
    pub id: MessageId,
    pub content: String,
    #[serde(default)]
    pub time: String,
    pub is_own: bool,
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub reactions: Vec<MessageReaction>,
    #[serde(default)]
    pub reply_to: Option<ReplyToInfo>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

impl DisplayMessage {
    /// Creates a plain text snapshot with no reactions, reply or attachment.
    pub fn new(id: impl Into<MessageId>, content: impl Into<String>, is_own: bool) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            time: String::new(),
            is_own,
            status: DeliveryStatus::None,
            timestamp: 0,
            reactions: Vec::new(),
            reply_to: None,
            attachment: None,
        }
    }

    pub fn with_status(mut self, status: DeliveryStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_reactions(mut self, reactions: Vec<MessageReaction>) -> Self {
        self.reactions = reactions;
        self
    }

    pub fn with_reply_to(mut self, reply_to: ReplyToInfo) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Checks reaction invariants the upstream owner is expected to keep.
    ///
    /// The bubble renders invalid snapshots anyway; this is for producers that want
    /// to reject bad data at their own boundary.
    pub fn validate(&self) -> SnapshotResult<()> {
        let mut seen = HashSet::with_capacity(self.reactions.len());
        for reaction in &self.reactions {
            if !seen.insert(reaction.emoji.as_str()) {
                return DuplicateReactionSnafu {
                    stage: "validate-snapshot-reactions",
                    message_id: self.id.clone(),
                    emoji: reaction.emoji.clone(),
                }
                .fail();
            }

            if !reaction.is_consistent() {
                return InconsistentReactionSnafu {
                    stage: "validate-snapshot-reactions",
                    message_id: self.id.clone(),
                    emoji: reaction.emoji.clone(),
                }
                .fail();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnapshotError;

    #[test]
    fn deserializes_camel_case_snapshot_with_defaults() {
        let json = r#"{
            "id": "m1",
            "content": "hi",
            "isOwn": false,
            "replyTo": { "id": "m0", "content": "earlier", "isOwn": true },
            "attachment": { "filename": "a.png", "mimeType": "image/png", "data": [1, 2, 3] }
        }"#;

        let message: DisplayMessage = serde_json::from_str(json).expect("valid snapshot");
        assert_eq!(message.id, MessageId::new("m1"));
        assert_eq!(message.status, DeliveryStatus::None);
        assert!(message.reactions.is_empty());
        assert_eq!(
            message.reply_to.as_ref().map(|reply| reply.is_own),
            Some(true)
        );
        let attachment = message.attachment.expect("attachment present");
        assert_eq!(attachment.source, AttachmentSource::Data(vec![1, 2, 3]));
    }

    #[test]
    fn url_attachment_deserializes_into_url_source() {
        let json = r#"{ "filename": "doc.pdf", "mimeType": "application/pdf", "url": "https://x/doc.pdf" }"#;
        let attachment: Attachment = serde_json::from_str(json).expect("valid attachment");
        assert_eq!(attachment.source, AttachmentSource::Url("https://x/doc.pdf".into()));
        assert_eq!(attachment.data(), None);
    }

    #[test]
    fn validate_rejects_duplicate_emoji() {
        let message = DisplayMessage::new("m1", "hi", false).with_reactions(vec![
            MessageReaction::new("👍", 1, false),
            MessageReaction::new("👍", 2, true),
        ]);

        assert!(matches!(
            message.validate(),
            Err(SnapshotError::DuplicateReaction { .. })
        ));
    }

    #[test]
    fn validate_rejects_reacted_with_zero_count() {
        let message = DisplayMessage::new("m1", "hi", false)
            .with_reactions(vec![MessageReaction::new("❤️", 0, true)]);

        assert!(matches!(
            message.validate(),
            Err(SnapshotError::InconsistentReaction { .. })
        ));
    }

    #[test]
    fn validate_accepts_zero_count_without_viewer() {
        let message = DisplayMessage::new("m1", "hi", false)
            .with_reactions(vec![MessageReaction::new("❤️", 0, false)]);
        assert!(message.validate().is_ok());
    }
}
