//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `sora-core` using sqlx with split
//! read/write pools. Sessions are loaded with their ordered messages and
//! completed milestones. Appends run in one write transaction guarded by
//! the session's `version` column.

use chrono::Utc;
use sora_core::chat::repository::SessionRepository;
use sora_types::chat::{
    ChatMessage, ChatSession, MessageMetadata, MessageRole, MilestoneStatus, NewMessage,
    SessionType,
};
use sora_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::{DatabasePool, format_datetime, parse_datetime, parse_uuid, query_err};

/// SQLite-backed implementation of `SessionRepository`.
#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Attach messages and completed milestones to a session row.
    async fn hydrate(&self, row: ChatSessionRow) -> Result<ChatSession, RepositoryError> {
        let mut session = row.into_session()?;
        let id = session.id.to_string();

        let rows = sqlx::query("SELECT * FROM chat_messages WHERE session_id = ? ORDER BY seq ASC")
            .bind(&id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_err)?;
        session.messages = rows
            .iter()
            .map(|row| {
                ChatMessageRow::from_row(row)
                    .map_err(query_err)
                    .and_then(ChatMessageRow::into_message)
            })
            .collect::<Result<_, _>>()?;

        let milestones: Vec<(i64,)> = sqlx::query_as(
            "SELECT milestone FROM pattern_milestones WHERE session_id = ? AND status = 'completed' ORDER BY milestone ASC",
        )
        .bind(&id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;
        session.pattern_milestones = milestones.into_iter().map(|(m,)| m as u32).collect();

        Ok(session)
    }

    async fn hydrate_all(
        &self,
        rows: &[sqlx::sqlite::SqliteRow],
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            let session_row = ChatSessionRow::from_row(row).map_err(query_err)?;
            sessions.push(self.hydrate(session_row).await?);
        }
        Ok(sessions)
    }

    async fn require_session(&self, session_id: &Uuid) -> Result<ChatSession, RepositoryError> {
        self.get_session(session_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn session_exists(&self, session_id: &Uuid) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT 1 FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_err)?;
        Ok(row.is_some())
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    id: String,
    user_id: String,
    title: Option<String>,
    session_type: String,
    is_active: bool,
    summary: Option<String>,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            session_type: row.try_get("session_type")?,
            is_active: row.try_get("is_active")?,
            summary: row.try_get("summary")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let session_type: SessionType = self
            .session_type
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatSession {
            id: parse_uuid(&self.id, "session id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            title: self.title,
            session_type,
            is_active: self.is_active,
            messages: Vec::new(),
            summary: self.summary,
            pattern_milestones: Vec::new(),
            version: self.version as u64,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    seq: i64,
    role: String,
    content: String,
    continuation_token: Option<String>,
    metadata: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            seq: row.try_get("seq")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            continuation_token: row.try_get("continuation_token")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let metadata: MessageMetadata = serde_json::from_str(&self.metadata)
            .map_err(|e| RepositoryError::Query(format!("invalid message metadata: {e}")))?;

        Ok(ChatMessage {
            seq: self.seq as u32,
            role,
            content: self.content,
            continuation_token: self.continuation_token,
            metadata,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// SessionRepository implementation
// ---------------------------------------------------------------------------

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, user_id, title, session_type, is_active, summary, version, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(&session.title)
        .bind(session.session_type.to_string())
        .bind(session.is_active)
        .bind(&session.summary)
        .bind(session.version as i64)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.message().contains("UNIQUE") {
                    return RepositoryError::Conflict(format!("session {} already exists", session.id));
                }
            }
            query_err(e)
        })?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row).map_err(query_err)?;
                Ok(Some(self.hydrate(session_row).await?))
            }
            None => Ok(None),
        }
    }

    async fn get_latest_active_session(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM chat_sessions WHERE user_id = ? AND is_active = 1
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row).map_err(query_err)?;
                Ok(Some(self.hydrate(session_row).await?))
            }
            None => Ok(None),
        }
    }

    async fn list_recent_sessions(
        &self,
        user_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions WHERE user_id = ? ORDER BY updated_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        self.hydrate_all(&rows).await
    }

    async fn list_sessions_by_creation(
        &self,
        user_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        self.hydrate_all(&rows).await
    }

    async fn deactivate_user_sessions(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chat_sessions SET is_active = 0, updated_at = ? WHERE user_id = ? AND is_active = 1",
        )
        .bind(format_datetime(&Utc::now()))
        .bind(user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(result.rows_affected())
    }

    async fn deactivate_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_sessions SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn append_messages(
        &self,
        session_id: &Uuid,
        expected_version: u64,
        title: Option<&str>,
        messages: &[NewMessage],
    ) -> Result<ChatSession, RepositoryError> {
        let id = session_id.to_string();
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        // Version guard: bump only if nobody appended since the caller read.
        let result = sqlx::query(
            "UPDATE chat_sessions
             SET version = version + 1, updated_at = ?, title = COALESCE(title, ?)
             WHERE id = ? AND version = ?",
        )
        .bind(format_datetime(&Utc::now()))
        .bind(title)
        .bind(&id)
        .bind(expected_version as i64)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM chat_sessions WHERE id = ?")
                .bind(&id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(query_err)?
                .is_some();
            tx.rollback().await.map_err(query_err)?;
            return if exists {
                Err(RepositoryError::Conflict(format!(
                    "session {session_id} changed since version {expected_version}"
                )))
            } else {
                Err(RepositoryError::NotFound)
            };
        }

        let (next_seq,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(seq) + 1, 0) FROM chat_messages WHERE session_id = ?",
        )
        .bind(&id)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_err)?;

        for (offset, message) in messages.iter().enumerate() {
            let metadata = serde_json::to_string(&message.metadata)
                .map_err(|e| RepositoryError::Query(format!("invalid message metadata: {e}")))?;
            sqlx::query(
                r#"INSERT INTO chat_messages (session_id, seq, role, content, continuation_token, metadata, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&id)
            .bind(next_seq + offset as i64)
            .bind(message.role.to_string())
            .bind(&message.content)
            .bind(&message.continuation_token)
            .bind(metadata)
            .bind(format_datetime(&message.created_at))
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)?;

        self.require_session(session_id).await
    }

    async fn set_summary(&self, session_id: &Uuid, summary: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE chat_sessions SET summary = ?, updated_at = ? WHERE id = ? AND summary IS NULL",
        )
        .bind(summary)
        .bind(format_datetime(&Utc::now()))
        .bind(session_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        if self.session_exists(session_id).await? {
            Ok(false)
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn claim_milestone(&self, session_id: &Uuid, milestone: u32) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO pattern_milestones (session_id, milestone, status, claimed_at)
             VALUES (?, ?, 'claimed', ?)",
        )
        .bind(session_id.to_string())
        .bind(i64::from(milestone))
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn finish_milestone(
        &self,
        session_id: &Uuid,
        milestone: u32,
        status: MilestoneStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE pattern_milestones SET status = ?, finished_at = ?
             WHERE session_id = ? AND milestone = ?",
        )
        .bind(status.to_string())
        .bind(format_datetime(&Utc::now()))
        .bind(session_id.to_string())
        .bind(i64::from(milestone))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
