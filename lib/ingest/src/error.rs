//! Error types for the ingest crate.

use std::fmt;

use copper_courier_core::PayloadCodecError;

/// Errors from publishing to the relay queue.
#[derive(Debug)]
pub enum PublishError {
    /// Could not connect to the queue server.
    ConnectionFailed { message: String },
    /// The work-queue stream could not be created or fetched.
    StreamSetupFailed { message: String },
    /// The message could not be encoded for the queue.
    EncodeFailed(PayloadCodecError),
    /// The publish itself failed or was not acknowledged.
    PublishFailed { message: String },
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { message } => {
                write!(f, "failed to connect to queue: {message}")
            }
            Self::StreamSetupFailed { message } => {
                write!(f, "failed to set up queue stream: {message}")
            }
            Self::EncodeFailed(e) => write!(f, "failed to encode message: {e}"),
            Self::PublishFailed { message } => write!(f, "failed to publish message: {message}"),
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EncodeFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PayloadCodecError> for PublishError {
    fn from(e: PayloadCodecError) -> Self {
        Self::EncodeFailed(e)
    }
}
