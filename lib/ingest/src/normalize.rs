//! Normalization of platform webhook events into queueable messages.
//!
//! The platform posts a batch of events per webhook call; each event is
//! normalized independently and the outcomes are independent of each other.
//! Normalization is pure: publishing happens separately so a whole batch
//! can be normalized before any publish occurs.

use chrono::{SecondsFormat, TimeZone, Utc};
use serde::Deserialize;

use copper_courier_core::{MessageKind, QueuedMessage};

/// Canned guidance pushed for message subtypes the relay does not handle.
pub const UNSUPPORTED_MESSAGE: &str =
    "すみません、このメッセージ形式には対応していません。テキスト・画像・動画・音声でお送りください。";

/// One event from the platform's webhook payload.
///
/// Fields the relay does not use are ignored at deserialization; the
/// subtype strings are kept raw so unknown subtypes can be routed to the
/// unsupported path instead of failing the whole batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEvent {
    /// Event type, e.g. `message`, `follow`, `unsend`.
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<PlatformMessage>,
    /// Event time in epoch milliseconds.
    #[serde(default)]
    pub timestamp: i64,
}

/// The originator of a platform event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// The message body of a `message` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMessage {
    pub id: String,
    /// Message subtype, e.g. `text`, `image`, `sticker`.
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Outcome of normalizing one platform event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedEvent {
    /// A message the relay handles; ready to publish.
    Queued(QueuedMessage),
    /// A message subtype the relay does not handle. The caller decides
    /// between an immediate guidance reply and dropping the event.
    Unsupported { reply_token: String },
    /// Not a user message, or missing a resolvable user id.
    Ignored,
}

/// Normalizes one platform event into zero or one queueable message.
///
/// Text content is copied verbatim; attachment kinds carry no content
/// because the bytes are fetched later, at dispatch time. The session id
/// is left unset; it is a caller-supplied hint, not webhook data.
#[must_use]
pub fn normalize(event: &PlatformEvent) -> NormalizedEvent {
    if event.event_type != "message" {
        return NormalizedEvent::Ignored;
    }
    let Some(user_id) = event
        .source
        .as_ref()
        .and_then(|source| source.user_id.as_deref())
        .filter(|id| !id.is_empty())
    else {
        return NormalizedEvent::Ignored;
    };
    let Some(message) = &event.message else {
        return NormalizedEvent::Ignored;
    };

    let (kind, text) = match message.message_type.as_str() {
        "text" => match &message.text {
            Some(text) => (MessageKind::Text, Some(text.clone())),
            None => return NormalizedEvent::Ignored,
        },
        "image" => (MessageKind::Image, None),
        "video" => (MessageKind::Video, None),
        "audio" => (MessageKind::Audio, None),
        other => {
            tracing::debug!(subtype = other, "unsupported message subtype");
            return match &event.reply_token {
                Some(reply_token) => NormalizedEvent::Unsupported {
                    reply_token: reply_token.clone(),
                },
                None => NormalizedEvent::Ignored,
            };
        }
    };

    NormalizedEvent::Queued(QueuedMessage {
        user_id: user_id.to_string(),
        reply_token: event.reply_token.clone().unwrap_or_default(),
        message_id: message.id.clone(),
        kind,
        text,
        session_id: None,
        timestamp: format_timestamp(event.timestamp),
    })
}

/// Formats an epoch-milliseconds event time as an ISO-8601 instant.
///
/// An out-of-range value yields an empty string; the media uploader treats
/// unparsable timestamps with its own fallback.
fn format_timestamp(epoch_millis: i64) -> String {
    Utc.timestamp_millis_opt(epoch_millis)
        .single()
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_from(value: serde_json::Value) -> PlatformEvent {
        serde_json::from_value(value).expect("platform event")
    }

    fn text_event() -> serde_json::Value {
        json!({
            "type": "message",
            "replyToken": "rt-1",
            "source": {"type": "user", "userId": "U1"},
            "message": {"id": "m-1", "type": "text", "text": "こんにちは"},
            "timestamp": 1_768_446_300_000_i64,
        })
    }

    #[test]
    fn text_message_is_queued_verbatim() {
        let NormalizedEvent::Queued(message) = normalize(&event_from(text_event())) else {
            panic!("expected queued");
        };
        assert_eq!(message.user_id, "U1");
        assert_eq!(message.reply_token, "rt-1");
        assert_eq!(message.message_id, "m-1");
        assert_eq!(message.kind, MessageKind::Text);
        assert_eq!(message.text.as_deref(), Some("こんにちは"));
        assert_eq!(message.session_id, None);
        assert_eq!(message.timestamp, "2026-01-15T03:05:00.000Z");
        assert!(message.validate().is_ok());
    }

    #[test]
    fn attachment_message_carries_no_text() {
        let mut value = text_event();
        value["message"] = json!({"id": "m-2", "type": "image"});
        let NormalizedEvent::Queued(message) = normalize(&event_from(value)) else {
            panic!("expected queued");
        };
        assert_eq!(message.kind, MessageKind::Image);
        assert_eq!(message.text, None);
        assert!(message.validate().is_ok());
    }

    #[test]
    fn non_message_event_is_ignored() {
        let mut value = text_event();
        value["type"] = json!("follow");
        assert_eq!(normalize(&event_from(value)), NormalizedEvent::Ignored);
    }

    #[test]
    fn missing_user_id_is_ignored() {
        let mut value = text_event();
        value["source"] = json!({"type": "group"});
        assert_eq!(normalize(&event_from(value)), NormalizedEvent::Ignored);

        let mut empty = text_event();
        empty["source"] = json!({"type": "user", "userId": ""});
        assert_eq!(normalize(&event_from(empty)), NormalizedEvent::Ignored);
    }

    #[test]
    fn sticker_is_unsupported_with_reply_token() {
        let mut value = text_event();
        value["message"] = json!({"id": "m-3", "type": "sticker"});
        assert_eq!(
            normalize(&event_from(value)),
            NormalizedEvent::Unsupported {
                reply_token: "rt-1".to_string(),
            }
        );
    }

    #[test]
    fn unsupported_without_reply_token_is_ignored() {
        let mut value = text_event();
        value["message"] = json!({"id": "m-3", "type": "location"});
        value.as_object_mut().expect("object").remove("replyToken");
        assert_eq!(normalize(&event_from(value)), NormalizedEvent::Ignored);
    }

    #[test]
    fn video_and_audio_map_to_their_kinds() {
        for (subtype, kind) in [("video", MessageKind::Video), ("audio", MessageKind::Audio)] {
            let mut value = text_event();
            value["message"] = json!({"id": "m-4", "type": subtype});
            let NormalizedEvent::Queued(message) = normalize(&event_from(value)) else {
                panic!("expected queued for {subtype}");
            };
            assert_eq!(message.kind, kind);
        }
    }

    #[test]
    fn out_of_range_timestamp_becomes_empty() {
        assert_eq!(format_timestamp(i64::MAX), "");
    }
}
