//! Messaging platform client.
//!
//! Two concerns: fetching attachment content by message id (served from the
//! platform's data host, separate from the API host) and delivering reply
//! text. Replies from the worker go out via push delivery because the
//! webhook reply token may have expired by the time a queued message is
//! processed; the token-based reply is kept for the immediate guidance path
//! on the webhook side.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::MessagingError;

/// Default API host for sends.
const DEFAULT_API_BASE: &str = "https://api.line.me";

/// Default host for message content downloads.
const DEFAULT_DATA_API_BASE: &str = "https://api-data.line.me";

/// Attachment content fetched from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    /// Content type reported by the platform, if any.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Access to the messaging platform.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Downloads the binary content of a message.
    async fn fetch_content(&self, message_id: &str) -> Result<FetchedContent, MessagingError>;

    /// Pushes a text message to a user, optionally with a sender display
    /// name attached.
    async fn push_text(
        &self,
        user_id: &str,
        text: &str,
        sender_name: Option<&str>,
    ) -> Result<(), MessagingError>;
}

/// Connection settings for the messaging platform.
#[derive(Debug, Clone)]
pub struct MessagingConfig {
    /// Channel access token for the bot.
    pub channel_access_token: String,
    /// API host override; defaults to the platform's API host.
    pub api_base: Option<String>,
    /// Data host override; defaults to the platform's content host.
    pub data_api_base: Option<String>,
}

impl MessagingConfig {
    fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    fn data_api_base(&self) -> &str {
        self.data_api_base.as_deref().unwrap_or(DEFAULT_DATA_API_BASE)
    }
}

/// Reqwest-backed messaging client.
pub struct HttpMessagingClient {
    http: reqwest::Client,
    config: MessagingConfig,
}

impl HttpMessagingClient {
    #[must_use]
    pub fn new(config: MessagingConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Replies with text via a webhook reply token.
    ///
    /// Only the webhook side uses this, for immediate guidance replies while
    /// the token is still fresh; the worker always pushes instead.
    pub async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), MessagingError> {
        let body = json!({
            "replyToken": reply_token,
            "messages": [text_message(text, None)],
        });
        self.send("/v2/bot/message/reply", &body).await
    }

    async fn send(&self, path: &str, body: &Value) -> Result<(), MessagingError> {
        let url = format!("{}{path}", self.config.api_base().trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.channel_access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| MessagingError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MessagingError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Builds the platform's text message object.
fn text_message(text: &str, sender_name: Option<&str>) -> Value {
    match sender_name {
        Some(name) => json!({"type": "text", "text": text, "sender": {"name": name}}),
        None => json!({"type": "text", "text": text}),
    }
}

#[async_trait]
impl MessagingClient for HttpMessagingClient {
    async fn fetch_content(&self, message_id: &str) -> Result<FetchedContent, MessagingError> {
        let url = format!(
            "{}/v2/bot/message/{message_id}/content",
            self.config.data_api_base().trim_end_matches('/'),
        );
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.channel_access_token)
            .send()
            .await
            .map_err(|e| MessagingError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MessagingError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MessagingError::RequestFailed {
                reason: e.to_string(),
            })?
            .to_vec();

        tracing::debug!(message_id, bytes = bytes.len(), "fetched message content");
        Ok(FetchedContent {
            content_type,
            bytes,
        })
    }

    async fn push_text(
        &self,
        user_id: &str,
        text: &str,
        sender_name: Option<&str>,
    ) -> Result<(), MessagingError> {
        let body = json!({
            "to": user_id,
            "messages": [text_message(text, sender_name)],
        });
        self.send("/v2/bot/message/push", &body).await?;
        tracing::info!(user_id, "pushed reply");
        Ok(())
    }
}
