//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Chat turns
        .route("/chat", post(handlers::chat::send_message))
        .route("/responseid/latest", get(handlers::chat::latest_response_id))
        // Session lifecycle
        .route("/session", post(handlers::session::start_session))
        .route("/session/end/{id}", post(handlers::session::end_session))
        .route("/session/{id}", get(handlers::session::get_messages))
        .route("/session/{id}/summary", post(handlers::session::set_summary))
        .route("/sessions/recent", get(handlers::session::recent_sessions))
        // Resumption
        .route(
            "/lastsession",
            get(handlers::last_session::get_last_session)
                .post(handlers::last_session::record_last_session),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
