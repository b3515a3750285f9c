//! Last-session resumption HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/lastsession - Record the session the user is viewing
//! - GET  /api/v1/lastsession - The recorded session, loaded

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use sora_types::chat::{LastSessionPointer, LastSessionView};

use crate::http::error::AppError;
use crate::http::extractors::auth::AuthenticatedUser;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LastSessionBody {
    pub session_id: Uuid,
    #[serde(default)]
    pub is_viewing_past_session: bool,
}

/// POST /api/v1/lastsession - Record the resumption pointer.
pub async fn record_last_session(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<LastSessionBody>,
) -> Result<Json<ApiResponse<LastSessionPointer>>, AppError> {
    let timer = RequestTimer::start();

    let pointer = state
        .chat
        .record_last_session(auth.user_id, body.session_id, body.is_viewing_past_session)
        .await?;

    Ok(Json(timer.finish(pointer)))
}

/// GET /api/v1/lastsession - The resumption pointer with its session.
pub async fn get_last_session(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<ApiResponse<LastSessionView>>, AppError> {
    let timer = RequestTimer::start();

    let view = state.chat.get_last_session(auth.user_id).await?;

    Ok(Json(timer.finish(view)))
}
