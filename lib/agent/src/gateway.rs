//! HTTP gateway to the streaming agent backend.
//!
//! The backend is a hosted reasoning engine with two methods: `:query` for
//! unary class-method calls (used to mint sessions) and `:streamQuery` for
//! the per-turn event stream. One user turn is one request; the stream is
//! buffered whole before interpretation, and no client-side timeout cuts a
//! long-running turn short.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::AgentError;

/// Class method that mints a new backend session.
const CREATE_SESSION_METHOD: &str = "async_create_session";

/// Class method that runs one streamed turn.
const STREAM_QUERY_METHOD: &str = "async_stream_query";

/// One user turn handed to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentMessage {
    /// Plain text turn.
    Text(String),
    /// Text plus one uploaded attachment, referenced by object URI.
    MultiPart {
        text: String,
        file_uri: String,
        mime_type: String,
    },
}

impl AgentMessage {
    /// Serializes the turn into the backend's message shape.
    ///
    /// A text turn is sent as a bare string; an attachment turn becomes a
    /// user-role content object with a text part and a file_data part.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::MultiPart {
                text,
                file_uri,
                mime_type,
            } => json!({
                "role": "user",
                "parts": [
                    {"text": text},
                    {"file_data": {"file_uri": file_uri, "mime_type": mime_type}},
                ],
            }),
        }
    }
}

/// Connection settings for the reasoning engine.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Cloud project that hosts the engine.
    pub project: String,
    /// Engine region, e.g. `us-central1`.
    pub region: String,
    /// Engine id, or a full `projects/...` resource path which is used
    /// as-is.
    pub engine_id: String,
    /// Bearer token for the backend API.
    pub access_token: String,
    /// API base override; defaults to the regional endpoint.
    pub api_base: Option<String>,
}

impl AgentConfig {
    /// Returns the engine's full resource path.
    #[must_use]
    pub fn engine_path(&self) -> String {
        if self.engine_id.starts_with("projects/") {
            return self.engine_id.clone();
        }
        format!(
            "projects/{}/locations/{}/reasoningEngines/{}",
            self.project, self.region, self.engine_id
        )
    }

    /// Returns the URL for one of the engine's methods.
    #[must_use]
    pub fn endpoint(&self, method: &str) -> String {
        let base = match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com/v1", self.region),
        };
        format!("{base}/{}:{method}", self.engine_path())
    }
}

/// Access to the agent backend.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Mints a new backend session for the user and returns its id.
    async fn create_session(&self, user_id: &str) -> Result<String, AgentError>;

    /// Runs one turn and returns the raw newline-delimited event stream.
    async fn query(
        &self,
        user_id: &str,
        session_id: &str,
        message: &AgentMessage,
    ) -> Result<String, AgentError>;
}

/// Reqwest-backed gateway.
pub struct AgentClient {
    http: reqwest::Client,
    config: AgentConfig,
}

impl AgentClient {
    #[must_use]
    pub fn new(config: AgentConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response, AgentError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl AgentGateway for AgentClient {
    async fn create_session(&self, user_id: &str) -> Result<String, AgentError> {
        let url = self.config.endpoint("query");
        let body = json!({
            "class_method": CREATE_SESSION_METHOD,
            "input": {"user_id": user_id},
        });

        let response = self.post(&url, &body).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        let session_id = payload
            .get("output")
            .and_then(|output| output.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::ResponseParseFailed {
                reason: "create_session response missing output.id".to_string(),
            })?;

        tracing::debug!(user_id, session_id, "created agent session");
        Ok(session_id.to_string())
    }

    async fn query(
        &self,
        user_id: &str,
        session_id: &str,
        message: &AgentMessage,
    ) -> Result<String, AgentError> {
        let url = self.config.endpoint("streamQuery");
        let body = json!({
            "class_method": STREAM_QUERY_METHOD,
            "input": {
                "user_id": user_id,
                "session_id": session_id,
                "message": message.to_value(),
            },
        });

        let response = self.post(&url, &body).await?;
        let raw = response
            .text()
            .await
            .map_err(|e| AgentError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        tracing::debug!(user_id, session_id, bytes = raw.len(), "agent turn streamed");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AgentConfig {
        AgentConfig {
            project: "proj".to_string(),
            region: "asia-northeast1".to_string(),
            engine_id: "4242".to_string(),
            access_token: "token".to_string(),
            api_base: None,
        }
    }

    #[test]
    fn engine_path_expands_bare_id() {
        assert_eq!(
            config().engine_path(),
            "projects/proj/locations/asia-northeast1/reasoningEngines/4242"
        );
    }

    #[test]
    fn engine_path_passes_through_resource_path() {
        let mut config = config();
        config.engine_id = "projects/other/locations/us-central1/reasoningEngines/7".to_string();
        assert_eq!(config.engine_path(), config.engine_id);
    }

    #[test]
    fn endpoint_uses_regional_base_by_default() {
        assert_eq!(
            config().endpoint("streamQuery"),
            "https://asia-northeast1-aiplatform.googleapis.com/v1/projects/proj/locations/asia-northeast1/reasoningEngines/4242:streamQuery"
        );
    }

    #[test]
    fn endpoint_honors_base_override() {
        let mut config = config();
        config.api_base = Some("http://127.0.0.1:9009/v1/".to_string());
        assert_eq!(
            config.endpoint("query"),
            "http://127.0.0.1:9009/v1/projects/proj/locations/asia-northeast1/reasoningEngines/4242:query"
        );
    }

    #[test]
    fn text_message_serializes_to_bare_string() {
        let message = AgentMessage::Text("hello".to_string());
        assert_eq!(message.to_value(), Value::String("hello".to_string()));
    }

    #[test]
    fn multipart_message_carries_file_data() {
        let message = AgentMessage::MultiPart {
            text: "please describe this image".to_string(),
            file_uri: "obj://media/image/user/U1/2026/01/15/m-1.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
        };
        let value = message.to_value();
        assert_eq!(value["role"], "user");
        assert_eq!(value["parts"][0]["text"], "please describe this image");
        assert_eq!(
            value["parts"][1]["file_data"]["file_uri"],
            "obj://media/image/user/U1/2026/01/15/m-1.jpg"
        );
        assert_eq!(value["parts"][1]["file_data"]["mime_type"], "image/jpeg");
    }
}
