//! Session lifecycle HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/session                - Start a session (deactivates the others)
//! - POST /api/v1/session/end/{id}       - End a session and analyze it
//! - GET  /api/v1/session/{id}           - Ordered messages of a session
//! - POST /api/v1/session/{id}/summary   - Set the summary once
//! - GET  /api/v1/sessions/recent        - Recently updated sessions

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sora_types::chat::{ChatMessage, ChatSession, SessionOverview, SessionType};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::handlers::parse_uuid;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Request body for starting a session. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct StartSessionBody {
    #[serde(default)]
    pub session_type: SessionType,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub session_type: SessionType,
    pub title: Option<String>,
}

/// POST /api/v1/session - Start a new session.
pub async fn start_session(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    body: Option<Json<StartSessionBody>>,
) -> Result<(StatusCode, Json<ApiResponse<SessionStarted>>), AppError> {
    let timer = RequestTimer::start();
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let title = body
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let session = state
        .chat
        .start_session(auth.user_id, body.session_type, title)
        .await?;

    let link = format!("/api/v1/session/{}", session.id);
    let started = SessionStarted {
        session_id: session.id,
        session_type: session.session_type,
        title: session.title,
    };

    Ok((
        StatusCode::CREATED,
        Json(timer.finish(started).with_link("self", &link)),
    ))
}

/// POST /api/v1/session/end/{id} - End a session.
///
/// Waits for pattern analysis over the session when it has messages.
pub async fn end_session(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<ChatSession>>, AppError> {
    let timer = RequestTimer::start();
    let sid = parse_uuid(&session_id)?;

    let session = state
        .chat
        .spawn_end_session(auth.user_id, sid)
        .await??;

    Ok(Json(timer.finish(session)))
}

/// GET /api/v1/session/{id} - Ordered messages of a session.
pub async fn get_messages(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, AppError> {
    let timer = RequestTimer::start();
    let sid = parse_uuid(&session_id)?;

    let messages = state.chat.messages(auth.user_id, sid).await?;

    Ok(Json(timer.finish(messages)))
}

#[derive(Debug, Deserialize)]
pub struct SummaryBody {
    pub summary: String,
}

/// POST /api/v1/session/{id}/summary - Set the session summary.
pub async fn set_summary(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(session_id): Path<String>,
    Json(body): Json<SummaryBody>,
) -> Result<Json<ApiResponse<ChatSession>>, AppError> {
    let timer = RequestTimer::start();
    let sid = parse_uuid(&session_id)?;

    let session = state
        .chat
        .set_summary(auth.user_id, sid, &body.summary)
        .await?;

    Ok(Json(timer.finish(session)))
}

/// GET /api/v1/sessions/recent - The user's most recently updated sessions.
pub async fn recent_sessions(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<SessionOverview>>>, AppError> {
    let timer = RequestTimer::start();

    let sessions = state.chat.recent_sessions(auth.user_id).await?;

    Ok(Json(
        timer
            .finish(sessions)
            .with_link("self", "/api/v1/sessions/recent"),
    ))
}
