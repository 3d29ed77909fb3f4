//! The relay dispatcher.
//!
//! Consumes one queued message per invocation and walks it through the
//! pipeline: reset check, session resolution, attachment upload, agent
//! call, stream interpretation, push reply. Every external dependency
//! comes in through the constructor so the whole state machine runs
//! against in-memory fakes in tests.
//!
//! Redelivery safety: the session upsert and the conditional object write
//! are the only mutations, and both are idempotent. Everything else is a
//! read or an outbound send, so a redelivered message repeats the pipeline
//! without corrupting state (the user may receive a duplicate reply, which
//! at-least-once delivery permits).

use copper_courier_agent::{AgentGateway, AgentMessage, interpret_stream};
use copper_courier_core::{Envelope, MessageKind, QueuedMessage};
use copper_courier_media::{MediaStore, MediaUploader, UploadRequest, resolve_content_type};
use copper_courier_session::{SessionStore, is_reset_command};

use crate::error::DispatchError;
use crate::messaging::MessagingClient;
use crate::reply::{
    EMPTY_RESPONSE_MESSAGE, RESET_MESSAGE, attachment_prompt, sender_display_name,
};

/// Terminal state of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The agent answered and the reply was pushed.
    Replied,
    /// A reset command was honored with the canned confirmation.
    ResetAcknowledged,
    /// The delivery was permanently undeliverable (undecodable or invalid)
    /// and should be acknowledged without processing.
    Discarded,
    /// A dependency failed; the caller should withhold the acknowledgement
    /// so the queue redelivers.
    Failed { reason: String },
}

/// Dispatches queued messages through the relay pipeline.
pub struct Dispatcher<S, G, M, B>
where
    S: SessionStore,
    G: AgentGateway,
    M: MessagingClient,
    B: MediaStore,
{
    sessions: S,
    gateway: G,
    messaging: M,
    uploader: MediaUploader<B>,
}

impl<S, G, M, B> Dispatcher<S, G, M, B>
where
    S: SessionStore,
    G: AgentGateway,
    M: MessagingClient,
    B: MediaStore,
{
    pub fn new(sessions: S, gateway: G, messaging: M, uploader: MediaUploader<B>) -> Self {
        Self {
            sessions,
            gateway,
            messaging,
            uploader,
        }
    }

    /// Handles one raw queue delivery.
    ///
    /// Envelope decode failures and invalid messages are discarded rather
    /// than failed: redelivering an undecodable payload cannot help.
    pub async fn handle_delivery(&self, payload: &[u8]) -> DispatchOutcome {
        let Ok(raw) = std::str::from_utf8(payload) else {
            tracing::warn!("dropping non-UTF-8 delivery");
            return DispatchOutcome::Discarded;
        };
        let envelope: Envelope<QueuedMessage> = match Envelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable delivery");
                return DispatchOutcome::Discarded;
            }
        };
        let message = envelope.into_payload();
        if let Err(e) = message.validate() {
            tracing::warn!(error = %e, "dropping invalid message");
            return DispatchOutcome::Discarded;
        }

        match self.process(&message).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    user_id = %message.user_id,
                    message_id = %message.message_id,
                    error = %e,
                    "dispatch failed"
                );
                DispatchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn process(&self, message: &QueuedMessage) -> Result<DispatchOutcome, DispatchError> {
        if message.kind == MessageKind::Text
            && is_reset_command(message.text.as_deref().unwrap_or_default())
        {
            self.sessions.delete(&message.user_id).await?;
            self.messaging
                .push_text(&message.user_id, RESET_MESSAGE, None)
                .await?;
            tracing::info!(user_id = %message.user_id, "session reset");
            return Ok(DispatchOutcome::ResetAcknowledged);
        }

        let session_id = self.resolve_session(message).await?;
        let agent_message = self.build_agent_message(message).await?;

        let raw = self
            .gateway
            .query(&message.user_id, &session_id, &agent_message)
            .await?;
        let reply = interpret_stream(&raw);

        let text = if reply.text.is_empty() {
            tracing::warn!(user_id = %message.user_id, "agent produced no text");
            EMPTY_RESPONSE_MESSAGE
        } else {
            reply.text.as_str()
        };
        let sender_name = reply.sender_id.and_then(sender_display_name);

        self.messaging
            .push_text(&message.user_id, text, sender_name)
            .await?;
        Ok(DispatchOutcome::Replied)
    }

    /// Resolves the session id: persisted row, then caller hint, then a
    /// freshly minted session. A session obtained without a persisted row
    /// is upserted so redeliveries and concurrent resolutions converge.
    async fn resolve_session(&self, message: &QueuedMessage) -> Result<String, DispatchError> {
        if let Some(existing) = self.sessions.find(&message.user_id).await? {
            return Ok(existing);
        }

        let session_id = match &message.session_id {
            Some(hint) => hint.clone(),
            None => self.gateway.create_session(&message.user_id).await?,
        };
        self.sessions.upsert(&message.user_id, &session_id).await?;
        Ok(session_id)
    }

    /// Builds the agent turn. Attachment kinds fetch their bytes from the
    /// platform, upload them idempotently, and reference the object URI.
    async fn build_agent_message(
        &self,
        message: &QueuedMessage,
    ) -> Result<AgentMessage, DispatchError> {
        if message.kind == MessageKind::Text {
            return Ok(AgentMessage::Text(
                message.text.clone().unwrap_or_default(),
            ));
        }

        let content = self.messaging.fetch_content(&message.message_id).await?;
        let mime_type = resolve_content_type(message.kind, content.content_type.as_deref());
        let request = UploadRequest {
            user_id: &message.user_id,
            message_id: &message.message_id,
            kind: message.kind,
            timestamp: &message.timestamp,
            content_type: content.content_type.as_deref(),
        };
        let file_uri = self.uploader.upload(request, &content.bytes).await?;

        Ok(AgentMessage::MultiPart {
            text: attachment_prompt(message.kind).to_string(),
            file_uri,
            mime_type,
        })
    }
}
