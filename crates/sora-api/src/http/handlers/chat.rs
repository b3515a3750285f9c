//! Chat turn HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/chat               - Run one chat turn
//! - GET  /api/v1/responseid/latest  - The user's latest continuation token

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sora_core::chat::service::{TurnOutcome, TurnRequest};
use sora_types::chat::{MessageMetadata, SessionType};
use sora_types::user::AccountType;

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Request body for a chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatTurnBody {
    pub message: String,
    #[serde(default)]
    pub account_type: AccountType,
    /// Continue from this token instead of the stored one.
    #[serde(default, alias = "previous_response_id")]
    pub previous_continuation_token: Option<String>,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub session_type: Option<SessionType>,
    #[serde(default)]
    pub metadata: MessageMetadata,
}

impl From<ChatTurnBody> for TurnRequest {
    fn from(body: ChatTurnBody) -> Self {
        TurnRequest {
            message: body.message,
            account_type: body.account_type,
            previous_continuation_token: body
                .previous_continuation_token
                .filter(|t| !t.trim().is_empty()),
            session_id: body.session_id,
            session_type: body.session_type,
            metadata: body.metadata,
        }
    }
}

/// POST /api/v1/chat - Run one chat turn.
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<ChatTurnBody>,
) -> Result<Json<ApiResponse<TurnOutcome>>, AppError> {
    let timer = RequestTimer::start();

    // Tracked so the turn is persisted even if the client disconnects.
    let outcome = state.chat.spawn_turn(auth.user_id, body.into()).await??;

    let session_link = format!("/api/v1/session/{}", outcome.session_id);
    Ok(Json(timer.finish(outcome).with_link("session", &session_link)))
}

#[derive(Debug, Serialize)]
pub struct LatestContinuation {
    pub continuation_token: Option<String>,
}

/// GET /api/v1/responseid/latest - The user's latest continuation token.
pub async fn latest_response_id(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<ApiResponse<LatestContinuation>>, AppError> {
    let timer = RequestTimer::start();

    let continuation_token = state.chat.latest_continuation(auth.user_id).await?;

    Ok(Json(timer.finish(LatestContinuation { continuation_token })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_defaults() {
        let body: ChatTurnBody = serde_json::from_str(r#"{"message": "hi"}"#).unwrap();
        let request: TurnRequest = body.into();

        assert_eq!(request.message, "hi");
        assert_eq!(request.account_type, AccountType::Individual);
        assert!(request.previous_continuation_token.is_none());
        assert!(request.session_id.is_none());
        assert!(request.session_type.is_none());
    }

    #[test]
    fn previous_response_id_alias_is_accepted() {
        let body: ChatTurnBody = serde_json::from_str(
            r#"{"message": "hi", "previous_response_id": "resp_9", "account_type": "therapist", "session_type": "crisis"}"#,
        )
        .unwrap();
        let request: TurnRequest = body.into();

        assert_eq!(request.previous_continuation_token.as_deref(), Some("resp_9"));
        assert_eq!(request.account_type, AccountType::Therapist);
        assert_eq!(request.session_type, Some(SessionType::Crisis));
    }

    #[test]
    fn blank_token_falls_back_to_stored_pointer() {
        let body: ChatTurnBody =
            serde_json::from_str(r#"{"message": "hi", "previous_continuation_token": "  "}"#).unwrap();
        let request: TurnRequest = body.into();

        assert!(request.previous_continuation_token.is_none());
    }
}
