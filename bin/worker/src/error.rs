//! Worker startup errors.

use std::fmt;

/// Failures while bringing the worker up.
///
/// Startup is fail-fast: any of these aborts the process so the hosting
/// platform restarts it with fresh state.
#[derive(Debug)]
pub enum WorkerError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// Database connection or migration failed.
    Database { details: String },
    /// Queue connection, stream, or consumer setup failed.
    Queue { details: String },
    /// The media bucket could not be opened.
    MediaBucket { details: String },
    /// The health endpoint could not bind its address.
    Bind { details: String },
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "failed to load configuration: {details}"),
            Self::Database { details } => write!(f, "database setup failed: {details}"),
            Self::Queue { details } => write!(f, "queue setup failed: {details}"),
            Self::MediaBucket { details } => write!(f, "failed to open media bucket: {details}"),
            Self::Bind { details } => write!(f, "failed to bind health endpoint: {details}"),
        }
    }
}

impl std::error::Error for WorkerError {}
