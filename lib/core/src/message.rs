//! The canonical queueable message.
//!
//! A `QueuedMessage` is the immutable unit handed from the ingest side to
//! the relay queue. The queue delivers at least once, so everything
//! downstream of this type must tolerate redelivery.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The platform message subtype carried by a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text message.
    Text,
    /// Image attachment.
    Image,
    /// Video attachment.
    Video,
    /// Audio attachment.
    Audio,
}

impl MessageKind {
    /// Returns true for attachment kinds whose content must be fetched
    /// from the platform and uploaded before the agent call.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::Audio)
    }

    /// Returns the lowercase wire name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical unit placed on the relay queue.
///
/// Created once by the normalizer from a single inbound platform event and
/// never mutated afterwards. `reply_token` may have expired by the time an
/// asynchronous worker processes the message; replies go out via push
/// delivery instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMessage {
    /// Platform user identifier (non-empty).
    pub user_id: String,
    /// Platform-issued reply token. Kept for observability only; must not
    /// be relied on for correctness.
    pub reply_token: String,
    /// Platform-unique message identifier, used for attachment fetch and
    /// object naming.
    pub message_id: String,
    /// Message subtype.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Text content. Present exactly when `kind` is `Text`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Caller-supplied session hint, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Event timestamp as an ISO-8601 instant.
    pub timestamp: String,
}

impl QueuedMessage {
    /// Validates the structural invariants of the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the user id is empty or if text presence does
    /// not match the message kind.
    pub fn validate(&self) -> Result<(), InvalidMessage> {
        if self.user_id.is_empty() {
            return Err(InvalidMessage::EmptyUserId);
        }
        match (self.kind, self.text.is_some()) {
            (MessageKind::Text, false) => Err(InvalidMessage::MissingText),
            (kind, true) if kind != MessageKind::Text => Err(InvalidMessage::UnexpectedText { kind }),
            _ => Ok(()),
        }
    }
}

/// Structural invariant violations in a queued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidMessage {
    /// The user identifier is empty.
    EmptyUserId,
    /// A text message carries no text content.
    MissingText,
    /// A non-text message carries text content.
    UnexpectedText { kind: MessageKind },
}

impl fmt::Display for InvalidMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUserId => write!(f, "queued message has an empty user id"),
            Self::MissingText => write!(f, "text message has no text content"),
            Self::UnexpectedText { kind } => {
                write!(f, "{kind} message unexpectedly carries text content")
            }
        }
    }
}

impl std::error::Error for InvalidMessage {}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message() -> QueuedMessage {
        QueuedMessage {
            user_id: "U1234".to_string(),
            reply_token: "rt-1".to_string(),
            message_id: "m-1".to_string(),
            kind: MessageKind::Text,
            text: Some("hello".to_string()),
            session_id: None,
            timestamp: "2025-06-01T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn text_message_is_valid() {
        assert!(text_message().validate().is_ok());
    }

    #[test]
    fn text_message_without_text_is_invalid() {
        let mut message = text_message();
        message.text = None;
        assert_eq!(message.validate(), Err(InvalidMessage::MissingText));
    }

    #[test]
    fn image_message_with_text_is_invalid() {
        let mut message = text_message();
        message.kind = MessageKind::Image;
        assert_eq!(
            message.validate(),
            Err(InvalidMessage::UnexpectedText {
                kind: MessageKind::Image
            })
        );
    }

    #[test]
    fn empty_user_id_is_invalid() {
        let mut message = text_message();
        message.user_id.clear();
        assert_eq!(message.validate(), Err(InvalidMessage::EmptyUserId));
    }

    #[test]
    fn wire_format_uses_camel_case_and_type() {
        let json = serde_json::to_value(text_message()).expect("to_value");
        assert_eq!(json["userId"], "U1234");
        assert_eq!(json["replyToken"], "rt-1");
        assert_eq!(json["messageId"], "m-1");
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hello");
        assert!(json.get("sessionId").is_none());
    }

    #[test]
    fn attachment_kinds() {
        assert!(!MessageKind::Text.is_attachment());
        assert!(MessageKind::Image.is_attachment());
        assert!(MessageKind::Video.is_attachment());
        assert!(MessageKind::Audio.is_attachment());
    }

    #[test]
    fn serde_roundtrip() {
        let message = text_message();
        let json = serde_json::to_string(&message).expect("serialize");
        let parsed: QueuedMessage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(message, parsed);
    }
}
