//! SQLite user repository.
//!
//! Implements `UserRepository` from `sora-core` and adds the account and
//! access-token operations used by the CLI and the HTTP auth extractor.

use chrono::Utc;
use sora_core::repository::user::UserRepository;
use sora_types::error::RepositoryError;
use sora_types::user::{TrialState, UserAccount};
use sqlx::Row;
use uuid::Uuid;

use super::pool::{DatabasePool, format_datetime, parse_datetime, parse_uuid, query_err};

/// SQLite-backed implementation of `UserRepository`.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Create a non-premium user on a fresh free trial.
    pub async fn create_user(&self, name: &str) -> Result<UserAccount, RepositoryError> {
        let user = UserAccount {
            id: Uuid::now_v7(),
            name: name.to_string(),
            is_premium: false,
            trial: TrialState::default(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, name, is_premium, is_free_trial, chat_count, created_at)
             VALUES (?, ?, 0, 1, 0, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(format_datetime(&user.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!("user '{name}' already exists"));
                }
            }
            query_err(e)
        })?;

        Ok(user)
    }

    pub async fn get_user_by_name(&self, name: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn set_premium(&self, user_id: &Uuid, is_premium: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET is_premium = ? WHERE id = ?")
            .bind(is_premium)
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Store the hash of a freshly issued access token.
    pub async fn store_token_hash(&self, user_id: &Uuid, token_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO user_tokens (token_hash, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token_hash)
            .bind(user_id.to_string())
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;
        Ok(())
    }

    /// Resolve a token hash to its user, touching `last_used_at`.
    pub async fn user_for_token_hash(&self, token_hash: &str) -> Result<Option<Uuid>, RepositoryError> {
        let row = sqlx::query("SELECT user_id FROM user_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_id: String = row.try_get("user_id").map_err(query_err)?;

        // Best effort; a failed touch does not reject the request.
        let _ = sqlx::query("UPDATE user_tokens SET last_used_at = ? WHERE token_hash = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(token_hash)
            .execute(&self.pool.writer)
            .await;

        parse_uuid(&user_id, "user id").map(Some)
    }

    pub async fn count_users(&self) -> Result<i64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM users")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_err)?;
        row.try_get("cnt").map_err(query_err)
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserAccount, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;
    let chat_count: i64 = row.try_get("chat_count").map_err(query_err)?;

    Ok(UserAccount {
        id: parse_uuid(&id, "user id")?,
        name: row.try_get("name").map_err(query_err)?,
        is_premium: row.try_get("is_premium").map_err(query_err)?,
        trial: TrialState {
            is_free_trial: row.try_get("is_free_trial").map_err(query_err)?,
            chat_count: chat_count as u32,
        },
        created_at: parse_datetime(&created_at)?,
    })
}

impl UserRepository for SqliteUserRepository {
    async fn get_user(&self, user_id: &Uuid) -> Result<Option<UserAccount>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn end_free_trial(&self, user_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET is_free_trial = 0 WHERE id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn increment_chat_count(&self, user_id: &Uuid) -> Result<u32, RepositoryError> {
        let row = sqlx::query(
            "UPDATE users SET chat_count = chat_count + 1 WHERE id = ? RETURNING chat_count",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_err)?
        .ok_or(RepositoryError::NotFound)?;

        let count: i64 = row.try_get("chat_count").map_err(query_err)?;
        Ok(count as u32)
    }
}
