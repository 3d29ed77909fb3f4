//! Queue publishing over NATS JetStream.
//!
//! Queued messages ride a work-queue stream: each message is delivered to
//! one consumer and removed on acknowledgement, with redelivery when the
//! consumer fails to ack. The publisher ensures the stream exists before
//! first use so either side of the relay can come up first.

use std::sync::Mutex;

use async_nats::jetstream;
use async_trait::async_trait;

use copper_courier_core::{Envelope, QueuedMessage};

use crate::error::PublishError;

/// Subject prefix for relay messages.
const MESSAGES_SUBJECT_PREFIX: &str = "courier.messages";

/// Default stream name for queued messages.
const MESSAGES_STREAM_NAME: &str = "COURIER_MESSAGES";

/// Configuration for the NATS-backed queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// NATS server URL.
    pub url: String,
    /// Stream name override (defaults to COURIER_MESSAGES).
    pub stream_name: Option<String>,
}

impl QueueConfig {
    /// Creates a new config with the given NATS URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            stream_name: None,
        }
    }

    /// Returns the stream name in effect.
    #[must_use]
    pub fn stream(&self) -> &str {
        self.stream_name.as_deref().unwrap_or(MESSAGES_STREAM_NAME)
    }

    /// Returns the subject queued messages are published to.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("{MESSAGES_SUBJECT_PREFIX}.inbound")
    }
}

/// Publishes queued messages onto the relay queue.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Publishes one message. Failures propagate; there is no internal
    /// retry, the caller decides whether to re-attempt.
    async fn publish(&self, message: &QueuedMessage) -> Result<(), PublishError>;
}

/// JetStream-backed publisher.
pub struct JetStreamPublisher {
    jetstream: jetstream::Context,
    config: QueueConfig,
}

impl JetStreamPublisher {
    /// Connects to NATS and ensures the work-queue stream exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or stream setup fails.
    pub async fn connect(config: QueueConfig) -> Result<Self, PublishError> {
        let client =
            async_nats::connect(&config.url)
                .await
                .map_err(|e| PublishError::ConnectionFailed {
                    message: e.to_string(),
                })?;
        let jetstream = jetstream::new(client);

        ensure_stream(&jetstream, &config).await?;

        Ok(Self { jetstream, config })
    }
}

/// Ensures the relay's work-queue stream exists.
///
/// # Errors
///
/// Returns an error if the stream cannot be created or fetched.
pub async fn ensure_stream(
    jetstream: &jetstream::Context,
    config: &QueueConfig,
) -> Result<(), PublishError> {
    let stream_config = jetstream::stream::Config {
        name: config.stream().to_string(),
        subjects: vec![format!("{MESSAGES_SUBJECT_PREFIX}.>")],
        storage: jetstream::stream::StorageType::File,
        retention: jetstream::stream::RetentionPolicy::WorkQueue,
        ..Default::default()
    };

    jetstream
        .get_or_create_stream(stream_config)
        .await
        .map_err(|e| PublishError::StreamSetupFailed {
            message: e.to_string(),
        })?;

    Ok(())
}

#[async_trait]
impl QueuePublisher for JetStreamPublisher {
    async fn publish(&self, message: &QueuedMessage) -> Result<(), PublishError> {
        let encoded = Envelope::new(message.clone()).encode()?;

        self.jetstream
            .publish(self.config.subject(), encoded.into_bytes().into())
            .await
            .map_err(|e| PublishError::PublishFailed {
                message: e.to_string(),
            })?
            .await
            .map_err(|e| PublishError::PublishFailed {
                message: e.to_string(),
            })?;

        tracing::debug!(
            user_id = %message.user_id,
            message_id = %message.message_id,
            "queued message published"
        );
        Ok(())
    }
}

/// In-memory publisher for tests.
#[derive(Default)]
pub struct MemoryQueuePublisher {
    published: Mutex<Vec<QueuedMessage>>,
}

impl MemoryQueuePublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages published so far.
    #[must_use]
    pub fn published(&self) -> Vec<QueuedMessage> {
        self.published.lock().expect("publisher lock").clone()
    }
}

#[async_trait]
impl QueuePublisher for MemoryQueuePublisher {
    async fn publish(&self, message: &QueuedMessage) -> Result<(), PublishError> {
        self.published
            .lock()
            .expect("publisher lock")
            .push(message.clone());
        Ok(())
    }
}
