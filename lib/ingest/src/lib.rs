//! Inbound event normalization and queue publishing for copper-courier.
//!
//! This crate sits at the entry of the relay: platform webhook events are
//! normalized into canonical queueable messages, then published onto the
//! at-least-once work queue the dispatcher consumes from.

pub mod error;
pub mod normalize;
pub mod publish;

pub use error::PublishError;
pub use normalize::{
    NormalizedEvent, PlatformEvent, PlatformMessage, UNSUPPORTED_MESSAGE, normalize,
};
pub use publish::{
    JetStreamPublisher, MemoryQueuePublisher, QueueConfig, QueuePublisher, ensure_stream,
};
