//! The media uploader.
//!
//! Builds the deterministic object key, resolves the content type and file
//! extension, and performs the conditional write. The key is addressed by
//! message identity (kind, user, date, message id), not by content hash, so
//! a redelivered message always maps to the same object.

use crate::error::MediaError;
use crate::store::{MediaStore, WriteOutcome};
use chrono::{DateTime, Datelike, Utc};
use copper_courier_core::MessageKind;

/// Date segment used when the message timestamp cannot be parsed.
const UNKNOWN_DATE_SEGMENT: &str = "unknown";

/// Extension used for content types missing from the lookup table.
const FALLBACK_EXTENSION: &str = "bin";

/// Parameters for one attachment upload.
#[derive(Debug, Clone)]
pub struct UploadRequest<'a> {
    /// Platform user identifier.
    pub user_id: &'a str,
    /// Platform message identifier.
    pub message_id: &'a str,
    /// Attachment kind (image, video, or audio).
    pub kind: MessageKind,
    /// Message timestamp as an ISO-8601 instant.
    pub timestamp: &'a str,
    /// Content type reported by the platform, if any.
    pub content_type: Option<&'a str>,
}

/// The media uploader.
pub struct MediaUploader<S: MediaStore> {
    store: S,
}

impl<S: MediaStore> MediaUploader<S> {
    /// Creates a new uploader over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Uploads attachment bytes idempotently and returns the object URI.
    ///
    /// An object already present under the deterministic key is treated as
    /// success; the URI is returned either way.
    ///
    /// # Errors
    ///
    /// Returns an error for non-attachment kinds or for store failures
    /// other than the existence short-circuit.
    pub async fn upload(
        &self,
        request: UploadRequest<'_>,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        if !request.kind.is_attachment() {
            return Err(MediaError::NotAnAttachment {
                kind: request.kind.to_string(),
            });
        }

        let content_type = resolve_content_type(request.kind, request.content_type);
        let extension = extension_for(&content_type);
        let key = object_key(&request, extension);

        match self.store.create_if_absent(&key, &content_type, bytes).await? {
            WriteOutcome::Created => {
                tracing::info!(%key, user_id = request.user_id, "uploaded attachment");
            }
            WriteOutcome::AlreadyExists => {
                tracing::info!(%key, user_id = request.user_id, "attachment already stored");
            }
        }

        Ok(self.store.object_uri(&key))
    }
}

/// Resolves the effective content type, falling back to a per-kind default.
#[must_use]
pub fn resolve_content_type(kind: MessageKind, content_type: Option<&str>) -> String {
    if let Some(content_type) = content_type
        && !content_type.is_empty()
    {
        return content_type.to_string();
    }
    match kind {
        MessageKind::Image => "image/jpeg",
        MessageKind::Audio => "audio/mpeg",
        _ => "video/mp4",
    }
    .to_string()
}

/// Maps a content type to a file extension via a fixed lookup table.
///
/// Parameters after `;` are ignored. Unknown types fall back to a generic
/// extension rather than failing.
#[must_use]
pub fn extension_for(content_type: &str) -> &'static str {
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    match normalized.as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "audio/mpeg" => "mp3",
        "audio/mp4" | "audio/m4a" => "m4a",
        "audio/aac" => "aac",
        "audio/ogg" => "ogg",
        "audio/wav" => "wav",
        _ => FALLBACK_EXTENSION,
    }
}

/// Builds the deterministic object key:
/// `<kind>/user/<userId>/<yyyy>/<mm>/<dd>/<messageId>.<ext>`.
///
/// Date components come from the message timestamp in UTC; an unparsable
/// timestamp collapses the date path to a fixed segment.
#[must_use]
pub fn object_key(request: &UploadRequest<'_>, extension: &str) -> String {
    match DateTime::parse_from_rfc3339(request.timestamp) {
        Ok(parsed) => {
            let utc = parsed.with_timezone(&Utc);
            format!(
                "{}/user/{}/{:04}/{:02}/{:02}/{}.{}",
                request.kind,
                request.user_id,
                utc.year(),
                utc.month(),
                utc.day(),
                request.message_id,
                extension,
            )
        }
        Err(_) => format!(
            "{}/user/{}/{}/{}.{}",
            request.kind, request.user_id, UNKNOWN_DATE_SEGMENT, request.message_id, extension,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryMediaStore;

    fn image_request<'a>() -> UploadRequest<'a> {
        UploadRequest {
            user_id: "U42",
            message_id: "m-7",
            kind: MessageKind::Image,
            timestamp: "2025-06-01T12:34:56Z",
            content_type: Some("image/png"),
        }
    }

    #[test]
    fn key_uses_utc_date_components() {
        let request = image_request();
        assert_eq!(
            object_key(&request, "png"),
            "image/user/U42/2025/06/01/m-7.png"
        );
    }

    #[test]
    fn key_converts_offset_timestamps_to_utc() {
        let request = UploadRequest {
            timestamp: "2025-06-01T08:30:00+09:00",
            ..image_request()
        };
        // 08:30 JST is 23:30 the previous day in UTC.
        assert_eq!(
            object_key(&request, "png"),
            "image/user/U42/2025/05/31/m-7.png"
        );
    }

    #[test]
    fn key_falls_back_on_unparsable_timestamp() {
        let request = UploadRequest {
            timestamp: "not a timestamp",
            ..image_request()
        };
        assert_eq!(object_key(&request, "png"), "image/user/U42/unknown/m-7.png");
    }

    #[test]
    fn content_type_defaults_per_kind() {
        assert_eq!(resolve_content_type(MessageKind::Image, None), "image/jpeg");
        assert_eq!(resolve_content_type(MessageKind::Audio, None), "audio/mpeg");
        assert_eq!(resolve_content_type(MessageKind::Video, None), "video/mp4");
        assert_eq!(resolve_content_type(MessageKind::Image, Some("")), "image/jpeg");
        assert_eq!(
            resolve_content_type(MessageKind::Image, Some("image/webp")),
            "image/webp"
        );
    }

    #[test]
    fn extension_lookup_table() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("audio/mp4"), "m4a");
        assert_eq!(extension_for("audio/m4a"), "m4a");
        assert_eq!(extension_for("video/mp4; codecs=avc1"), "mp4");
        assert_eq!(extension_for("IMAGE/PNG"), "png");
        assert_eq!(extension_for("application/x-unknown"), "bin");
    }

    #[tokio::test]
    async fn upload_returns_uri() {
        let uploader = MediaUploader::new(MemoryMediaStore::new("media"));
        let uri = uploader
            .upload(image_request(), b"png bytes")
            .await
            .expect("upload");
        assert_eq!(uri, "obj://media/image/user/U42/2025/06/01/m-7.png");
    }

    #[tokio::test]
    async fn redelivered_upload_is_idempotent() {
        let store = MemoryMediaStore::new("media");
        let uploader = MediaUploader::new(store);

        let first = uploader
            .upload(image_request(), b"png bytes")
            .await
            .expect("first upload");
        let second = uploader
            .upload(image_request(), b"png bytes")
            .await
            .expect("second upload");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn second_upload_issues_no_write() {
        let uploader = MediaUploader::new(MemoryMediaStore::new("media"));
        uploader
            .upload(image_request(), b"png bytes")
            .await
            .expect("first upload");
        uploader
            .upload(image_request(), b"png bytes")
            .await
            .expect("second upload");

        assert_eq!(uploader.store.write_count(), 1);
    }

    #[tokio::test]
    async fn text_kind_is_rejected() {
        let uploader = MediaUploader::new(MemoryMediaStore::new("media"));
        let request = UploadRequest {
            kind: MessageKind::Text,
            ..image_request()
        };
        let result = uploader.upload(request, b"").await;
        assert!(matches!(result, Err(MediaError::NotAnAttachment { .. })));
    }
}
