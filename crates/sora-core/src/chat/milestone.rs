//! Milestone-driven pattern analysis.
//!
//! Inline analysis fires when a session's message count lands on a
//! multiple of the configured interval. A milestone is claimed in storage
//! before the analyzer runs, so the analyzer is invoked at most once per
//! `(session, milestone)` even under redelivery. A failed run is recorded
//! and never retried.
//!
//! The end-session path bypasses claims entirely and always runs.

use std::sync::Arc;

use sora_types::chat::MilestoneStatus;
use sora_types::inference::InferenceError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::repository::SessionRepository;
use crate::collaborator::patterns::PatternAnalyzer;

/// How an inline milestone evaluation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneOutcome {
    NotAMilestone,
    /// Another turn already claimed this milestone.
    AlreadyClaimed,
    /// The claim could not be written; the analyzer was not called.
    ClaimFailed,
    Completed,
    Failed,
}

/// Detects milestones and drives the pattern analyzer.
pub struct MilestoneTrigger<S: SessionRepository, A: PatternAnalyzer> {
    sessions: Arc<S>,
    analyzer: Arc<A>,
    interval: u32,
}

impl<S: SessionRepository, A: PatternAnalyzer> Clone for MilestoneTrigger<S, A> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            analyzer: Arc::clone(&self.analyzer),
            interval: self.interval,
        }
    }
}

impl<S: SessionRepository, A: PatternAnalyzer> MilestoneTrigger<S, A> {
    pub fn new(sessions: Arc<S>, analyzer: Arc<A>, interval: u32) -> Self {
        Self {
            sessions,
            analyzer,
            interval,
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Whether `count` is a positive multiple of the interval.
    pub fn is_milestone(&self, count: u32) -> bool {
        self.interval > 0 && count > 0 && count % self.interval == 0
    }

    /// Evaluate the inline trigger for a session that now holds `count`
    /// messages.
    #[tracing::instrument(name = "milestone_inline", skip(self), fields(user_id = %user_id, session_id = %session_id))]
    pub async fn run_inline(&self, user_id: Uuid, session_id: Uuid, count: u32) -> MilestoneOutcome {
        if !self.is_milestone(count) {
            return MilestoneOutcome::NotAMilestone;
        }

        match self.sessions.claim_milestone(&session_id, count).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(milestone = count, "Milestone already claimed");
                return MilestoneOutcome::AlreadyClaimed;
            }
            Err(e) => {
                warn!(milestone = count, error = %e, "Failed to claim milestone, skipping analysis");
                return MilestoneOutcome::ClaimFailed;
            }
        }

        let (status, outcome) = match self.analyzer.analyze(&user_id, &session_id).await {
            Ok(_) => {
                info!(milestone = count, "Pattern analysis completed");
                (MilestoneStatus::Completed, MilestoneOutcome::Completed)
            }
            Err(e) => {
                warn!(milestone = count, error = %e, "Pattern analysis failed, milestone will not be retried");
                (MilestoneStatus::Failed, MilestoneOutcome::Failed)
            }
        };

        if let Err(e) = self
            .sessions
            .finish_milestone(&session_id, count, status)
            .await
        {
            warn!(milestone = count, error = %e, "Failed to record milestone status");
        }

        outcome
    }

    /// Run the analyzer without consulting or recording claims.
    pub async fn run_unconditional(
        &self,
        user_id: &Uuid,
        session_id: &Uuid,
    ) -> Result<String, InferenceError> {
        self.analyzer.analyze(user_id, session_id).await
    }
}
