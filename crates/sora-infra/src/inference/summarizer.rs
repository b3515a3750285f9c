//! HttpSummarizer -- [`Summarizer`] over `POST /api/summarize`.
//!
//! Loads the user's most recently created sessions, flattens them into a
//! bounded transcript, and asks the microservice for a short digest. A user
//! with no history gets an empty summary without a network call.

use sora_core::chat::repository::SessionRepository;
use sora_core::chat::transcript;
use sora_core::collaborator::summarizer::Summarizer;
use sora_types::config::{EndpointConfig, SummaryWindowConfig};
use sora_types::inference::InferenceError;
use uuid::Uuid;

use super::Endpoint;
use super::types::{SummarizeRequestBody, SummarizeResponseBody};

pub struct HttpSummarizer<S: SessionRepository> {
    sessions: S,
    endpoint: Endpoint,
    window: SummaryWindowConfig,
}

impl<S: SessionRepository> HttpSummarizer<S> {
    pub fn new(
        sessions: S,
        config: &EndpointConfig,
        window: SummaryWindowConfig,
    ) -> Result<Self, InferenceError> {
        Ok(Self {
            sessions,
            endpoint: Endpoint::from_config(config)?,
            window,
        })
    }
}

impl<S: SessionRepository> Summarizer for HttpSummarizer<S> {
    async fn summarize(&self, user_id: &Uuid) -> Result<String, InferenceError> {
        let sessions = self
            .sessions
            .list_sessions_by_creation(user_id, self.window.max_sessions)
            .await
            .map_err(|e| InferenceError::Storage(e.to_string()))?;

        let window = transcript::recent_window(&sessions, self.window.max_chars);
        if window.trim().is_empty() {
            return Ok(String::new());
        }

        let body: SummarizeResponseBody = self
            .endpoint
            .post_json(
                "/api/summarize",
                &SummarizeRequestBody {
                    user_id: *user_id,
                    transcript: &window,
                },
            )
            .await?;

        Ok(body.summary.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_support::test_pool;
    use crate::sqlite::session::SqliteSessionRepository;
    use crate::sqlite::user::SqliteUserRepository;
    use sora_types::chat::{ChatSession, MessageMetadata, NewMessage, SessionType};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer) -> (HttpSummarizer<SqliteSessionRepository>, SqliteSessionRepository, Uuid) {
        let pool = test_pool().await;
        let user = SqliteUserRepository::new(pool.clone())
            .create_user("tester")
            .await
            .unwrap();
        let sessions = SqliteSessionRepository::new(pool);
        let mut config = EndpointConfig::summarizer();
        config.base_url = server.uri();
        let summarizer =
            HttpSummarizer::new(sessions.clone(), &config, SummaryWindowConfig::default()).unwrap();
        (summarizer, sessions, user.id)
    }

    #[tokio::test]
    async fn test_no_history_skips_the_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summarize"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let (summarizer, _sessions, user_id) = setup(&server).await;

        assert_eq!(summarizer.summarize(&user_id).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_summarizes_recent_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summarize"))
            .and(body_partial_json(serde_json::json!({
                "transcript": "User: I argued with my sister\nAssistant: That sounds painful.\n"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"summary": " Family conflict. "})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let (summarizer, sessions, user_id) = setup(&server).await;
        let session = ChatSession::new(user_id, SessionType::General, None);
        sessions.create_session(&session).await.unwrap();
        sessions
            .append_messages(
                &session.id,
                0,
                None,
                &[
                    NewMessage::user("I argued with my sister", MessageMetadata::default()),
                    NewMessage::assistant("That sounds painful.", "resp_1"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(summarizer.summarize(&user_id).await.unwrap(), "Family conflict.");
    }

    #[tokio::test]
    async fn test_window_takes_newest_created_sessions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summarize"))
            .and(body_partial_json(serde_json::json!({
                "transcript": "User: newer session\n"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"summary": "ok"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let (_, sessions, user_id) = setup(&server).await;
        let mut config = EndpointConfig::summarizer();
        config.base_url = server.uri();
        let window = SummaryWindowConfig {
            max_sessions: 1,
            ..SummaryWindowConfig::default()
        };
        let summarizer = HttpSummarizer::new(sessions.clone(), &config, window).unwrap();

        let older = ChatSession::new(user_id, SessionType::General, None);
        sessions.create_session(&older).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = ChatSession::new(user_id, SessionType::General, None);
        sessions.create_session(&newer).await.unwrap();
        sessions
            .append_messages(
                &newer.id,
                0,
                None,
                &[NewMessage::user("newer session", MessageMetadata::default())],
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        // Touching the older session last must not pull it into the window.
        sessions
            .append_messages(
                &older.id,
                0,
                None,
                &[NewMessage::user("older session", MessageMetadata::default())],
            )
            .await
            .unwrap();

        assert_eq!(summarizer.summarize(&user_id).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_service_failure_surfaces_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/summarize"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let (summarizer, sessions, user_id) = setup(&server).await;
        let session = ChatSession::new(user_id, SessionType::General, None);
        sessions.create_session(&session).await.unwrap();
        sessions
            .append_messages(
                &session.id,
                0,
                None,
                &[NewMessage::user("hi", MessageMetadata::default())],
            )
            .await
            .unwrap();

        let err = summarizer.summarize(&user_id).await.unwrap_err();

        assert!(matches!(err, InferenceError::Status { status: 500, .. }));
    }
}
