//! Request, reply, and error types for the external inference service.
//!
//! The same error type covers the summarizer and pattern-mining
//! collaborators, which are served by the same microservice.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use std::fmt;

use crate::chat::SessionType;
use crate::user::AccountType;

/// Persona the model answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    Companion,
    Coaching,
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceMode::Companion => write!(f, "companion"),
            InferenceMode::Coaching => write!(f, "coaching"),
        }
    }
}

/// Everything the inference service needs to answer one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub user_id: Uuid,
    pub message: String,
    pub account_type: AccountType,
    pub mode: InferenceMode,
    pub previous_continuation_token: Option<String>,
    pub session_id: Uuid,
    pub session_type: SessionType,
    /// Digest of the user's recent sessions. `None` when the summarizer failed.
    pub context_summary: Option<String>,
}

/// Normalized reply from the inference service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceReply {
    pub reply_text: String,
    pub continuation_id: String,
}

/// Failure talking to the inference microservice or one of its siblings.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("empty reply from service")]
    EmptyReply,

    /// Local history could not be read, or the result could not be stored.
    #[error("storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_display() {
        let err = InferenceError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "service returned HTTP 503: unavailable");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(InferenceMode::Companion.to_string(), "companion");
        assert_eq!(InferenceMode::Coaching.to_string(), "coaching");
    }
}
