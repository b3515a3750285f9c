//! PatternAnalyzer trait definition.

use sora_types::inference::InferenceError;
use uuid::Uuid;

/// Mines behavioral patterns from a finished or long-running session.
pub trait PatternAnalyzer: Send + Sync {
    /// Analyze a session and return the generated patterns text.
    fn analyze(
        &self,
        user_id: &Uuid,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<String, InferenceError>> + Send;
}
