//! Error types for the session crate.

use std::fmt;

/// Errors from session store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    /// Lookup failed.
    LookupFailed { reason: String },
    /// Upsert failed.
    UpsertFailed { reason: String },
    /// Delete failed.
    DeleteFailed { reason: String },
}

impl fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LookupFailed { reason } => write!(f, "session lookup failed: {reason}"),
            Self::UpsertFailed { reason } => write!(f, "session upsert failed: {reason}"),
            Self::DeleteFailed { reason } => write!(f, "session delete failed: {reason}"),
        }
    }
}

impl std::error::Error for SessionStoreError {}
