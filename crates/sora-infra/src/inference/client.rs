//! HttpInferenceClient -- [`InferenceClient`] over the microservice's
//! `POST /api/chat` endpoint.
//!
//! One request per turn. There is no retry here: a failure fails the turn.

use sora_core::collaborator::inference::InferenceClient;
use sora_types::config::EndpointConfig;
use sora_types::inference::{InferenceError, InferenceReply, InferenceRequest};
use tracing::debug;

use super::Endpoint;
use super::types::{ChatRequestBody, ChatResponseBody};

/// Inference client for the chat endpoint.
///
/// Intentionally not `Debug`: the endpoint may hold an API key.
pub struct HttpInferenceClient {
    endpoint: Endpoint,
}

impl HttpInferenceClient {
    pub fn new(config: &EndpointConfig) -> Result<Self, InferenceError> {
        Ok(Self {
            endpoint: Endpoint::from_config(config)?,
        })
    }
}

impl InferenceClient for HttpInferenceClient {
    async fn infer(&self, request: &InferenceRequest) -> Result<InferenceReply, InferenceError> {
        let started = std::time::Instant::now();
        let body: ChatResponseBody = self
            .endpoint
            .post_json("/api/chat", &ChatRequestBody::from(request))
            .await?;

        if body.message.trim().is_empty() || body.response_id.trim().is_empty() {
            return Err(InferenceError::EmptyReply);
        }

        debug!(
            session_id = %request.session_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Inference reply received"
        );
        Ok(body.into())
    }
}
