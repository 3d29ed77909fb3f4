//! Error types for the media crate.

use std::fmt;

/// Errors from media store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaStoreError {
    /// The existence check failed.
    ExistenceCheckFailed { key: String, reason: String },
    /// The write failed.
    WriteFailed { key: String, reason: String },
    /// The store backend could not be reached.
    Unavailable { reason: String },
}

impl fmt::Display for MediaStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExistenceCheckFailed { key, reason } => {
                write!(f, "existence check failed for '{key}': {reason}")
            }
            Self::WriteFailed { key, reason } => {
                write!(f, "media write failed for '{key}': {reason}")
            }
            Self::Unavailable { reason } => write!(f, "media store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for MediaStoreError {}

/// Errors from the media uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The underlying store failed.
    Store(MediaStoreError),
    /// The message kind cannot carry an attachment.
    NotAnAttachment { kind: String },
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "media store error: {e}"),
            Self::NotAnAttachment { kind } => {
                write!(f, "message kind '{kind}' has no attachment content")
            }
        }
    }
}

impl std::error::Error for MediaError {}

impl From<MediaStoreError> for MediaError {
    fn from(e: MediaStoreError) -> Self {
        Self::Store(e)
    }
}
