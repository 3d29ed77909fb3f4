//! Idempotent attachment uploads for copper-courier.
//!
//! Attachment bytes fetched from the messaging platform are stored under a
//! deterministic, identity-addressed key before the agent call references
//! them. The conditional write plus the stable key make redelivered uploads
//! collapse into a single stored object.

pub mod error;
pub mod store;
pub mod upload;

pub use error::{MediaError, MediaStoreError};
pub use store::{MediaStore, MemoryMediaStore, ObjectBucketStore, WriteOutcome};
pub use upload::{MediaUploader, UploadRequest, resolve_content_type};
