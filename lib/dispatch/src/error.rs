//! Error types for the dispatch crate.

use std::fmt;

use copper_courier_agent::AgentError;
use copper_courier_media::MediaError;
use copper_courier_session::SessionStoreError;

/// Errors from the messaging platform client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// The request could not be sent.
    RequestFailed { reason: String },
    /// The platform answered with a non-success status.
    UnexpectedStatus { status: u16 },
}

impl fmt::Display for MessagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed { reason } => write!(f, "messaging request failed: {reason}"),
            Self::UnexpectedStatus { status } => {
                write!(f, "messaging platform returned status {status}")
            }
        }
    }
}

impl std::error::Error for MessagingError {}

/// Errors from dispatching one queued message.
///
/// All variants are treated as transient: the caller withholds the queue
/// acknowledgement and redelivery provides the retry.
#[derive(Debug)]
pub enum DispatchError {
    /// Session lookup, upsert, or delete failed.
    Session(SessionStoreError),
    /// Attachment upload failed.
    Media(MediaError),
    /// The agent backend call failed.
    Agent(AgentError),
    /// Content fetch or reply delivery failed.
    Messaging(MessagingError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "session store error: {e}"),
            Self::Media(e) => write!(f, "media upload error: {e}"),
            Self::Agent(e) => write!(f, "agent backend error: {e}"),
            Self::Messaging(e) => write!(f, "messaging platform error: {e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            Self::Media(e) => Some(e),
            Self::Agent(e) => Some(e),
            Self::Messaging(e) => Some(e),
        }
    }
}

impl From<SessionStoreError> for DispatchError {
    fn from(e: SessionStoreError) -> Self {
        Self::Session(e)
    }
}

impl From<MediaError> for DispatchError {
    fn from(e: MediaError) -> Self {
        Self::Media(e)
    }
}

impl From<AgentError> for DispatchError {
    fn from(e: AgentError) -> Self {
        Self::Agent(e)
    }
}

impl From<MessagingError> for DispatchError {
    fn from(e: MessagingError) -> Self {
        Self::Messaging(e)
    }
}
