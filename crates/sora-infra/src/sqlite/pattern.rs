//! SQLite pattern report repository.

use sora_core::repository::pattern::PatternReportRepository;
use sora_types::chat::PatternReport;
use sora_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::{DatabasePool, format_datetime, parse_datetime, parse_uuid, query_err};

/// SQLite-backed implementation of `PatternReportRepository`.
#[derive(Clone)]
pub struct SqlitePatternReportRepository {
    pool: DatabasePool,
}

impl SqlitePatternReportRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn report_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<PatternReport, RepositoryError> {
    let id: String = row.try_get("id").map_err(query_err)?;
    let user_id: String = row.try_get("user_id").map_err(query_err)?;
    let session_id: String = row.try_get("session_id").map_err(query_err)?;
    let created_at: String = row.try_get("created_at").map_err(query_err)?;

    Ok(PatternReport {
        id: parse_uuid(&id, "report id")?,
        user_id: parse_uuid(&user_id, "user_id")?,
        session_id: parse_uuid(&session_id, "session_id")?,
        patterns_text: row.try_get("patterns_text").map_err(query_err)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl PatternReportRepository for SqlitePatternReportRepository {
    async fn save_report(&self, report: &PatternReport) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO pattern_reports (id, user_id, session_id, patterns_text, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(report.id.to_string())
        .bind(report.user_id.to_string())
        .bind(report.session_id.to_string())
        .bind(&report.patterns_text)
        .bind(format_datetime(&report.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn list_reports(&self, user_id: &Uuid) -> Result<Vec<PatternReport>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM pattern_reports WHERE user_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter().map(report_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_support::test_pool;
    use crate::sqlite::session::SqliteSessionRepository;
    use crate::sqlite::user::SqliteUserRepository;
    use chrono::Utc;
    use sora_core::chat::repository::SessionRepository;
    use sora_types::chat::{ChatSession, SessionType};

    #[tokio::test]
    async fn test_save_and_list_reports() {
        let pool = test_pool().await;
        let user = SqliteUserRepository::new(pool.clone())
            .create_user("tester")
            .await
            .unwrap();
        let session = ChatSession::new(user.id, SessionType::General, None);
        SqliteSessionRepository::new(pool.clone())
            .create_session(&session)
            .await
            .unwrap();
        let repo = SqlitePatternReportRepository::new(pool);

        for text in ["first pattern", "second pattern"] {
            repo.save_report(&PatternReport {
                id: Uuid::now_v7(),
                user_id: user.id,
                session_id: session.id,
                patterns_text: text.to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        }

        let reports = repo.list_reports(&user.id).await.unwrap();
        let texts: Vec<&str> = reports.iter().map(|r| r.patterns_text.as_str()).collect();
        assert_eq!(texts, vec!["first pattern", "second pattern"]);
        assert!(repo.list_reports(&Uuid::now_v7()).await.unwrap().is_empty());
    }
}
