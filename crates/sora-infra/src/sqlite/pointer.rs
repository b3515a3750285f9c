//! SQLite pointer repository.
//!
//! Both tables hold one row per user and are written with
//! `INSERT .. ON CONFLICT(user_id) DO UPDATE`, so every write is an
//! idempotent overwrite.

use chrono::Utc;
use sora_core::repository::pointer::PointerRepository;
use sora_types::chat::{LastSessionPointer, ResponseChainPointer};
use sora_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::{DatabasePool, format_datetime, parse_datetime, parse_uuid, query_err};

/// SQLite-backed implementation of `PointerRepository`.
#[derive(Clone)]
pub struct SqlitePointerRepository {
    pool: DatabasePool,
}

impl SqlitePointerRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl PointerRepository for SqlitePointerRepository {
    async fn upsert_continuation(
        &self,
        user_id: &Uuid,
        continuation_token: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO response_chain (user_id, continuation_token, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   continuation_token = excluded.continuation_token,
                   updated_at = excluded.updated_at"#,
        )
        .bind(user_id.to_string())
        .bind(continuation_token)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn get_continuation(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<ResponseChainPointer>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM response_chain WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let updated_at: String = row.try_get("updated_at").map_err(query_err)?;

        Ok(Some(ResponseChainPointer {
            user_id: *user_id,
            continuation_token: row.try_get("continuation_token").map_err(query_err)?,
            updated_at: parse_datetime(&updated_at)?,
        }))
    }

    async fn upsert_last_session(&self, pointer: &LastSessionPointer) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO last_sessions (user_id, session_id, is_viewing_past_session, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   session_id = excluded.session_id,
                   is_viewing_past_session = excluded.is_viewing_past_session,
                   updated_at = excluded.updated_at"#,
        )
        .bind(pointer.user_id.to_string())
        .bind(pointer.session_id.to_string())
        .bind(pointer.is_viewing_past_session)
        .bind(format_datetime(&pointer.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn get_last_session(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<LastSessionPointer>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM last_sessions WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let session_id: String = row.try_get("session_id").map_err(query_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(query_err)?;

        Ok(Some(LastSessionPointer {
            user_id: *user_id,
            session_id: parse_uuid(&session_id, "session_id")?,
            is_viewing_past_session: row.try_get("is_viewing_past_session").map_err(query_err)?,
            updated_at: parse_datetime(&updated_at)?,
        }))
    }
}
