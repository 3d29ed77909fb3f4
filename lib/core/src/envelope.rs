//! Versioned envelope for queue payloads.
//!
//! Every message placed on the relay queue is wrapped in this envelope so
//! the payload schema can evolve without ambiguity about which version a
//! redelivered message was published under. Consumers reject versions newer
//! than they understand instead of guessing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;

/// The current envelope version.
pub const CURRENT_VERSION: u32 = 1;

/// A versioned envelope that wraps serialized data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The version of the envelope format.
    pub version: u32,
    /// The wrapped payload.
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Creates a new envelope with the current version.
    #[must_use]
    pub fn new(payload: T) -> Self {
        Self {
            version: CURRENT_VERSION,
            payload,
        }
    }

    /// Unwraps the envelope, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Returns a reference to the payload.
    #[must_use]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Returns true if this envelope uses the current version.
    #[must_use]
    pub fn is_current_version(&self) -> bool {
        self.version == CURRENT_VERSION
    }
}

impl<T: Serialize> Envelope<T> {
    /// Encodes the envelope as base64-wrapped UTF-8 JSON, the on-queue form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<String, PayloadCodecError> {
        let json = serde_json::to_vec(self).map_err(|e| PayloadCodecError::Serialize {
            reason: e.to_string(),
        })?;
        Ok(BASE64.encode(json))
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decodes an envelope from its base64-wrapped on-queue form.
    ///
    /// # Errors
    ///
    /// Returns an error if the base64 wrapping or the JSON inside it is
    /// malformed, or if the envelope was published under a version newer
    /// than this consumer understands.
    pub fn decode(data: &str) -> Result<Self, PayloadCodecError> {
        let bytes = BASE64
            .decode(data.trim())
            .map_err(|e| PayloadCodecError::Base64 {
                reason: e.to_string(),
            })?;
        Self::from_json_bytes(&bytes)
    }

    /// Deserializes an envelope from JSON bytes, enforcing the version gate.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON or an unsupported version.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, PayloadCodecError> {
        let envelope: Self =
            serde_json::from_slice(bytes).map_err(|e| PayloadCodecError::Deserialize {
                reason: e.to_string(),
            })?;
        if envelope.version > CURRENT_VERSION {
            return Err(PayloadCodecError::UnsupportedVersion {
                version: envelope.version,
            });
        }
        Ok(envelope)
    }
}

/// Errors from encoding or decoding queue payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadCodecError {
    /// Payload serialization failed.
    Serialize { reason: String },
    /// The base64 wrapping is invalid.
    Base64 { reason: String },
    /// The JSON inside the wrapping is invalid.
    Deserialize { reason: String },
    /// The envelope was published under a version this consumer does not know.
    UnsupportedVersion { version: u32 },
}

impl fmt::Display for PayloadCodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize { reason } => write!(f, "payload serialization failed: {reason}"),
            Self::Base64 { reason } => write!(f, "invalid base64 payload: {reason}"),
            Self::Deserialize { reason } => write!(f, "invalid payload JSON: {reason}"),
            Self::UnsupportedVersion { version } => {
                write!(f, "unsupported envelope version: {version}")
            }
        }
    }
}

impl std::error::Error for PayloadCodecError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct TestPayload {
        message: String,
        count: u32,
    }

    #[test]
    fn envelope_creation() {
        let payload = TestPayload {
            message: "hello".to_string(),
            count: 42,
        };
        let envelope = Envelope::new(payload.clone());

        assert_eq!(envelope.version, CURRENT_VERSION);
        assert_eq!(envelope.payload(), &payload);
        assert!(envelope.is_current_version());
    }

    #[test]
    fn encode_decode_roundtrip() {
        let envelope = Envelope::new(TestPayload {
            message: "test".to_string(),
            count: 100,
        });

        let encoded = envelope.encode().expect("encode");
        let parsed: Envelope<TestPayload> = Envelope::decode(&encoded).expect("decode");

        assert_eq!(envelope, parsed);
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let result: Result<Envelope<TestPayload>, _> = Envelope::decode("not base64!!!");
        assert!(matches!(result, Err(PayloadCodecError::Base64 { .. })));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let encoded = BASE64.encode(b"{not json");
        let result: Result<Envelope<TestPayload>, _> = Envelope::decode(&encoded);
        assert!(matches!(result, Err(PayloadCodecError::Deserialize { .. })));
    }

    #[test]
    fn decode_rejects_future_version() {
        let json = serde_json::json!({
            "version": CURRENT_VERSION + 1,
            "payload": { "message": "from the future", "count": 1 },
        });
        let encoded = BASE64.encode(serde_json::to_vec(&json).expect("to_vec"));
        let result: Result<Envelope<TestPayload>, _> = Envelope::decode(&encoded);
        assert!(matches!(
            result,
            Err(PayloadCodecError::UnsupportedVersion { version }) if version == CURRENT_VERSION + 1
        ));
    }

    #[test]
    fn envelope_json_structure() {
        let envelope = Envelope::new(TestPayload {
            message: "structure".to_string(),
            count: 1,
        });
        let json = serde_json::to_value(&envelope).expect("to_value");

        assert_eq!(json["version"], CURRENT_VERSION);
        assert!(json.get("payload").is_some());
    }
}
