//! InferenceClient trait definition.

use sora_types::inference::{InferenceError, InferenceReply, InferenceRequest};

/// Client for the external inference microservice.
///
/// One call per turn, no retry. A failure fails the whole turn.
pub trait InferenceClient: Send + Sync {
    fn infer(
        &self,
        request: &InferenceRequest,
    ) -> impl std::future::Future<Output = Result<InferenceReply, InferenceError>> + Send;
}
