//! Bearer-token authentication extractor.
//!
//! Extracts the access token from:
//! - `Authorization: Bearer <token>` header
//! - `X-API-Key: <token>` header
//!
//! Tokens are SHA-256 hashed and looked up in the `user_tokens` table.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use sora_infra::sqlite::user::SqliteUserRepository;
use sora_types::error::RepositoryError;

use crate::http::error::AppError;
use crate::state::AppState;

/// Prefix of every issued access token.
pub const TOKEN_PREFIX: &str = "sora_";

/// The user a request is acting for.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let token_hash = hash_token(&token);

        match state.users.user_for_token_hash(&token_hash).await? {
            Some(user_id) => Ok(AuthenticatedUser { user_id }),
            None => Err(AppError::Unauthorized(
                "Invalid access token. Provide a valid token via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
            )),
        }
    }
}

/// Extract the access token from request headers.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(key_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing access token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
    ))
}

/// Compute SHA-256 hash of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// Generate a token for `user_id` and store its hash.
///
/// Returns the plaintext token; it cannot be recovered later.
pub async fn issue_token(
    users: &SqliteUserRepository,
    user_id: &Uuid,
) -> Result<String, RepositoryError> {
    let token = format!(
        "{TOKEN_PREFIX}{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    );
    users.store_token_hash(user_id, &hash_token(&token)).await?;
    Ok(token)
}
