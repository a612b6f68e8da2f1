use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::Serialize;

use crate::message::{Attachment, AttachmentSource};

const IMAGE_MIME_PREFIX: &str = "image/";

/// Resolved rendering mode for an attachment, computed once per input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttachmentRender {
    /// Inline preview; `uri` is a self-contained `data:` URI.
    #[serde(rename_all = "camelCase")]
    Image { uri: String, caption: String },
    /// Generic descriptor with no preview.
    #[serde(rename_all = "camelCase")]
    File { filename: String, mime_type: String },
}

impl AttachmentRender {
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// Decides how an attachment renders.
///
/// Only inline image bytes get a preview. URL payloads, empty payloads and every
/// other MIME type fall back to the file descriptor; nothing here fails.
pub fn resolve_attachment(attachment: &Attachment) -> AttachmentRender {
    match attachment.data() {
        Some(bytes) if is_image_mime(&attachment.mime_type) => AttachmentRender::Image {
            uri: image_data_uri(&attachment.mime_type, bytes),
            caption: attachment.filename.clone(),
        },
        Some(_) | None => AttachmentRender::File {
            filename: attachment.filename.clone(),
            mime_type: attachment.mime_type.clone(),
        },
    }
}

/// Builds `data:<mime>;base64,<payload>` from raw bytes.
pub fn image_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime_type.trim(),
        BASE64_STANDARD.encode(bytes)
    )
}

fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .trim()
        .get(..IMAGE_MIME_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(IMAGE_MIME_PREFIX))
}

/// Memoizes the last resolution so unchanged snapshots skip re-encoding.
#[derive(Debug, Default)]
pub struct AttachmentResolver {
    last: Option<(Attachment, AttachmentRender)>,
}

impl AttachmentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, attachment: &Attachment) -> &AttachmentRender {
        let stale = self
            .last
            .as_ref()
            .is_some_and(|(cached, _)| !same_input(cached, attachment));
        if stale {
            self.last = None;
        }

        let (_, render) = self.last.get_or_insert_with(|| {
            tracing::trace!(
                filename = %attachment.filename,
                mime_type = %attachment.mime_type,
                "resolving attachment"
            );
            (attachment.clone(), resolve_attachment(attachment))
        });
        render
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

fn same_input(cached: &Attachment, incoming: &Attachment) -> bool {
    // Cheap fields first; the byte comparison is the expensive one.
    cached.mime_type == incoming.mime_type
        && cached.filename == incoming.filename
        && match (&cached.source, &incoming.source) {
            (AttachmentSource::Data(left), AttachmentSource::Data(right)) => left == right,
            (AttachmentSource::Url(left), AttachmentSource::Url(right)) => left == right,
            _ => false,
        }
}
