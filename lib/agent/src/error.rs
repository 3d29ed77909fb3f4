//! Error types for the agent crate.

use std::fmt;

/// Errors from agent backend calls.
///
/// The gateway performs no internal retry; each failure surfaces as a
/// single error and the queue's redelivery provides the retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The request could not be sent.
    RequestFailed { reason: String },
    /// The backend answered with a non-success status.
    UnexpectedStatus { status: u16 },
    /// The response body could not be read or parsed.
    ResponseParseFailed { reason: String },
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "agent request failed: {reason}"),
            Self::UnexpectedStatus { status } => {
                write!(f, "agent backend returned status {status}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse agent response: {reason}")
            }
        }
    }
}

impl std::error::Error for AgentError {}
