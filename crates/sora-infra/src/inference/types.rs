//! Wire types for the inference microservice.
//!
//! The microservice speaks its own field names (`previous_response_id`,
//! `response_id`); these types translate between them and the domain
//! request and reply.

use serde::{Deserialize, Serialize};
use sora_types::chat::SessionType;
use sora_types::inference::{InferenceMode, InferenceReply, InferenceRequest};
use sora_types::user::AccountType;
use uuid::Uuid;

/// Body of `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequestBody<'a> {
    pub user_id: Uuid,
    pub message: &'a str,
    /// Sent as `null` on a user's first ever turn.
    pub previous_response_id: Option<&'a str>,
    pub account_type: AccountType,
    pub mode: InferenceMode,
    pub session_id: Uuid,
    pub session_type: SessionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_summary: Option<&'a str>,
}

impl<'a> From<&'a InferenceRequest> for ChatRequestBody<'a> {
    fn from(request: &'a InferenceRequest) -> Self {
        Self {
            user_id: request.user_id,
            message: &request.message,
            previous_response_id: request.previous_continuation_token.as_deref(),
            account_type: request.account_type,
            mode: request.mode,
            session_id: request.session_id,
            session_type: request.session_type,
            context_summary: request.context_summary.as_deref(),
        }
    }
}

/// Reply of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatResponseBody {
    pub response_id: String,
    pub message: String,
}

impl From<ChatResponseBody> for InferenceReply {
    fn from(body: ChatResponseBody) -> Self {
        Self {
            reply_text: body.message,
            continuation_id: body.response_id,
        }
    }
}

/// Body of `POST /api/summarize`.
#[derive(Debug, Serialize)]
pub struct SummarizeRequestBody<'a> {
    pub user_id: Uuid,
    pub transcript: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeResponseBody {
    pub summary: String,
}

/// Body of `POST /api/patterns`.
#[derive(Debug, Serialize)]
pub struct PatternsRequestBody<'a> {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub transcript: &'a str,
    /// Earlier reports for the user, oldest first.
    pub previous_patterns: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct PatternsResponseBody {
    pub patterns: String,
}
