//! Summarizer trait definition.

use sora_types::inference::InferenceError;
use uuid::Uuid;

/// Produces a short digest of a user's recent sessions.
///
/// The implementation owns its windowing and recency rules; callers treat
/// the result as opaque text and degrade to no summary on failure.
pub trait Summarizer: Send + Sync {
    fn summarize(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<String, InferenceError>> + Send;
}
