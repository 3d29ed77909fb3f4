//! Centralized worker configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, with `__` separating nested sections
//! (e.g. `NATS__URL`, `AGENT__ENGINE_ID`).

use serde::Deserialize;

use copper_courier_agent::AgentConfig;
use copper_courier_dispatch::MessagingConfig;
use copper_courier_ingest::QueueConfig;

/// Worker configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct WorkerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Queue connection configuration.
    #[serde(default)]
    pub nats: NatsSettings,

    /// Agent backend configuration.
    pub agent: AgentSettings,

    /// Messaging platform configuration.
    pub messaging: MessagingSettings,

    /// HTTP server configuration.
    #[serde(default)]
    pub http: HttpSettings,

    /// Media storage configuration.
    #[serde(default)]
    pub media: MediaSettings,
}

/// NATS connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NatsSettings {
    /// NATS server URL.
    #[serde(default = "default_nats_url")]
    pub url: String,

    /// Stream name override.
    #[serde(default)]
    pub stream_name: Option<String>,

    /// Durable consumer name for this worker.
    #[serde(default = "default_consumer_name")]
    pub consumer_name: String,
}

/// Agent backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    /// Cloud project that hosts the reasoning engine.
    pub project: String,
    /// Engine region.
    pub region: String,
    /// Engine id, or a full resource path.
    pub engine_id: String,
    /// Bearer token for the backend API.
    pub access_token: String,
    /// API base override, mainly for local testing.
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Messaging platform settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingSettings {
    /// Channel access token for the bot.
    pub channel_access_token: String,
    /// API host override.
    #[serde(default)]
    pub api_base: Option<String>,
    /// Content host override.
    #[serde(default)]
    pub data_api_base: Option<String>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// Address the health endpoint listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

/// Media storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    /// Object store bucket for attachments.
    #[serde(default = "default_media_bucket")]
    pub bucket: String,
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_consumer_name() -> String {
    "courier-worker".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_media_bucket() -> String {
    "courier-media".to_string()
}

impl Default for NatsSettings {
    fn default() -> Self {
        Self {
            url: default_nats_url(),
            stream_name: None,
            consumer_name: default_consumer_name(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            bucket: default_media_bucket(),
        }
    }
}

impl WorkerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the queue configuration for the relay stream.
    #[must_use]
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            url: self.nats.url.clone(),
            stream_name: self.nats.stream_name.clone(),
        }
    }

    /// Returns the agent backend configuration.
    #[must_use]
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            project: self.agent.project.clone(),
            region: self.agent.region.clone(),
            engine_id: self.agent.engine_id.clone(),
            access_token: self.agent.access_token.clone(),
            api_base: self.agent.api_base.clone(),
        }
    }

    /// Returns the messaging platform configuration.
    #[must_use]
    pub fn messaging_config(&self) -> MessagingConfig {
        MessagingConfig {
            channel_access_token: self.messaging.channel_access_token.clone(),
            api_base: self.messaging.api_base.clone(),
            data_api_base: self.messaging.data_api_base.clone(),
        }
    }
}
