use thiserror::Error;

use crate::inference::InferenceError;

/// Errors from repository operations (used by trait definitions in sora-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by the chat orchestrator.
///
/// Only `QuotaExceeded` and `Inference` are expected user-visible outcomes
/// of a turn; collaborator failures after a successful reply are absorbed.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("free trial message limit reached")]
    QuotaExceeded,

    #[error("chat session not found")]
    SessionNotFound,

    #[error("no last session recorded")]
    LastSessionNotFound,

    #[error("session summary already set")]
    SummaryAlreadySet,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}
