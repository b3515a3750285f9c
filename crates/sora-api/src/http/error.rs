//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use sora_types::error::{ChatError, RepositoryError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Orchestrator errors.
    Chat(ChatError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Chat(ChatError::Repository(e))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {e}"))
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(ChatError::QuotaExceeded) => (
                StatusCode::FORBIDDEN,
                "QUOTA_EXCEEDED",
                "Free trial message limit reached".to_string(),
            ),
            AppError::Chat(ChatError::Inference(_)) => (
                StatusCode::BAD_GATEWAY,
                "INFERENCE_FAILED",
                "The assistant is unavailable right now, please try again".to_string(),
            ),
            AppError::Chat(ChatError::SessionNotFound) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "Chat session not found".to_string(),
            ),
            AppError::Chat(ChatError::LastSessionNotFound) => (
                StatusCode::NOT_FOUND,
                "LAST_SESSION_NOT_FOUND",
                "No last session recorded".to_string(),
            ),
            AppError::Chat(ChatError::SummaryAlreadySet) => (
                StatusCode::CONFLICT,
                "SUMMARY_ALREADY_SET",
                "Session summary already set".to_string(),
            ),
            AppError::Chat(ChatError::Validation(msg)) | AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Chat(ChatError::Repository(RepositoryError::NotFound)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found".to_string())
            }
            AppError::Chat(e) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        match &self {
            AppError::Chat(ChatError::Inference(e)) => {
                tracing::warn!(error = %e, "Chat turn failed at inference");
            }
            _ if status.is_server_error() => tracing::error!(code, %message, "Request failed"),
            _ => {}
        }

        let body = ApiResponse::error(code, &message, Uuid::now_v7().to_string(), 0);
        (status, Json(body)).into_response()
    }
}
