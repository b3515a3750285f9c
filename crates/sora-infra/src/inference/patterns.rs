//! HttpPatternAnalyzer -- [`PatternAnalyzer`] over `POST /api/patterns`.
//!
//! Sends the session transcript together with the user's earlier pattern
//! reports, then stores the returned text as a new [`PatternReport`]. The
//! call only counts as successful once the report is stored.

use chrono::Utc;
use sora_core::chat::repository::SessionRepository;
use sora_core::chat::transcript;
use sora_core::collaborator::patterns::PatternAnalyzer;
use sora_core::repository::pattern::PatternReportRepository;
use sora_types::chat::PatternReport;
use sora_types::config::EndpointConfig;
use sora_types::inference::InferenceError;
use tracing::info;
use uuid::Uuid;

use super::Endpoint;
use super::types::{PatternsRequestBody, PatternsResponseBody};

pub struct HttpPatternAnalyzer<S: SessionRepository, R: PatternReportRepository> {
    sessions: S,
    reports: R,
    endpoint: Endpoint,
}

impl<S: SessionRepository, R: PatternReportRepository> HttpPatternAnalyzer<S, R> {
    pub fn new(sessions: S, reports: R, config: &EndpointConfig) -> Result<Self, InferenceError> {
        Ok(Self {
            sessions,
            reports,
            endpoint: Endpoint::from_config(config)?,
        })
    }
}

fn storage_err(e: impl std::fmt::Display) -> InferenceError {
    InferenceError::Storage(e.to_string())
}

impl<S: SessionRepository, R: PatternReportRepository> PatternAnalyzer for HttpPatternAnalyzer<S, R> {
    async fn analyze(&self, user_id: &Uuid, session_id: &Uuid) -> Result<String, InferenceError> {
        let session = self
            .sessions
            .get_session(session_id)
            .await
            .map_err(storage_err)?
            .ok_or_else(|| storage_err(format!("session {session_id} not found")))?;
        let previous = self.reports.list_reports(user_id).await.map_err(storage_err)?;

        let transcript = transcript::render(&session.messages);
        let body: PatternsResponseBody = self
            .endpoint
            .post_json(
                "/api/patterns",
                &PatternsRequestBody {
                    user_id: *user_id,
                    session_id: *session_id,
                    transcript: &transcript,
                    previous_patterns: previous.iter().map(|r| r.patterns_text.as_str()).collect(),
                },
            )
            .await?;

        let patterns = body.patterns.trim().to_string();
        if patterns.is_empty() {
            return Err(InferenceError::EmptyReply);
        }

        let report = PatternReport {
            id: Uuid::now_v7(),
            user_id: *user_id,
            session_id: *session_id,
            patterns_text: patterns.clone(),
            created_at: Utc::now(),
        };
        self.reports.save_report(&report).await.map_err(storage_err)?;
        info!(user_id = %user_id, session_id = %session_id, report_id = %report.id, "Pattern report saved");

        Ok(patterns)
    }
}
