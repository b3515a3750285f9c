//! Outbound inference request assembly.
//!
//! `ContextComposer` pulls a cross-session digest from the summarizer and
//! packs it with the turn into an [`InferenceRequest`]. A summarizer
//! failure degrades to an empty context; it never fails the turn.

use sora_types::chat::ChatSession;
use sora_types::inference::InferenceRequest;
use sora_types::user::AccountType;
use tracing::warn;

use crate::collaborator::summarizer::Summarizer;

/// Builds inference requests for a turn.
pub struct ContextComposer<Z: Summarizer> {
    summarizer: Z,
}

impl<Z: Summarizer> ContextComposer<Z> {
    pub fn new(summarizer: Z) -> Self {
        Self { summarizer }
    }

    /// Compose the request for `message` in `session`.
    #[tracing::instrument(
        name = "compose_context",
        skip(self, session, message, previous_token),
        fields(user_id = %session.user_id, session_id = %session.id)
    )]
    pub async fn compose(
        &self,
        session: &ChatSession,
        message: &str,
        account_type: AccountType,
        previous_token: Option<String>,
    ) -> InferenceRequest {
        let context_summary = match self.summarizer.summarize(&session.user_id).await {
            Ok(summary) if !summary.trim().is_empty() => Some(summary),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Summarizer failed, continuing without context summary");
                None
            }
        };

        InferenceRequest {
            user_id: session.user_id,
            message: message.to_string(),
            account_type,
            mode: account_type.inference_mode(),
            previous_continuation_token: previous_token,
            session_id: session.id,
            session_type: session.session_type,
            context_summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{MockSummarizer, session_with_messages};
    use sora_types::inference::InferenceMode;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_compose_includes_summary_and_mode() {
        let composer = ContextComposer::new(MockSummarizer::ok("user has been anxious"));
        let session = session_with_messages(Uuid::now_v7(), 2);

        let request = composer
            .compose(
                &session,
                "hello",
                AccountType::Therapist,
                Some("resp_9".to_string()),
            )
            .await;

        assert_eq!(request.message, "hello");
        assert_eq!(request.session_id, session.id);
        assert_eq!(request.mode, InferenceMode::Coaching);
        assert_eq!(request.previous_continuation_token.as_deref(), Some("resp_9"));
        assert_eq!(request.context_summary.as_deref(), Some("user has been anxious"));
    }

    #[tokio::test]
    async fn test_compose_degrades_when_summarizer_fails() {
        let composer = ContextComposer::new(MockSummarizer::failing());
        let session = session_with_messages(Uuid::now_v7(), 0);

        let request = composer
            .compose(&session, "hi", AccountType::Individual, None)
            .await;

        assert!(request.context_summary.is_none());
        assert_eq!(request.mode, InferenceMode::Companion);
    }

    #[tokio::test]
    async fn test_compose_treats_blank_summary_as_absent() {
        let composer = ContextComposer::new(MockSummarizer::ok("   "));
        let session = session_with_messages(Uuid::now_v7(), 0);

        let request = composer
            .compose(&session, "hi", AccountType::Individual, None)
            .await;

        assert!(request.context_summary.is_none());
    }
}
