//! Chat service orchestrating the turn pipeline and session lifecycle.
//!
//! ChatService coordinates the session store, the per-user pointer rows,
//! the user's trial state, and the three external collaborators. A turn
//! runs: trial gate, session resolution, context composition, inference,
//! atomic append, continuation pointer update, milestone trigger.
//!
//! Only quota rejection and inference failure surface to the caller as
//! turn outcomes. Once the model has answered, bookkeeping failures are
//! logged and absorbed, except for the append itself.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sora_types::chat::{
    ChatMessage, ChatSession, DEFAULT_SESSION_TITLE, LastSessionPointer, LastSessionView,
    MessageMetadata, NewMessage, SessionOverview, SessionType,
};
use sora_types::config::{MilestoneConfig, TrialConfig};
use sora_types::error::{ChatError, RepositoryError};
use sora_types::user::AccountType;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::context::ContextComposer;
use crate::chat::milestone::MilestoneTrigger;
use crate::chat::repository::SessionRepository;
use crate::chat::title::derive_title;
use crate::chat::trial::{GateDecision, TrialGate};
use crate::collaborator::inference::InferenceClient;
use crate::collaborator::patterns::PatternAnalyzer;
use crate::collaborator::summarizer::Summarizer;
use crate::repository::pointer::PointerRepository;
use crate::repository::user::UserRepository;

/// How many sessions the recent-sessions listing returns.
pub const RECENT_SESSIONS_LIMIT: u32 = 20;

/// Append attempts before a version conflict is surfaced.
const MAX_APPEND_ATTEMPTS: u32 = 3;

/// One inbound chat message.
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub message: String,
    pub account_type: AccountType,
    /// Overrides the stored continuation pointer when present.
    pub previous_continuation_token: Option<String>,
    pub session_id: Option<Uuid>,
    /// Used only when a session has to be created for this turn.
    pub session_type: Option<SessionType>,
    pub metadata: MessageMetadata,
}

/// Result of a completed turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub message_count: u32,
    pub title: String,
    pub continuation_token: String,
    pub session_id: Uuid,
}

/// Orchestrates chat turns and session lifecycle.
///
/// Generic over every repository and collaborator so sora-core never
/// depends on sora-infra.
pub struct ChatService<S, P, U, I, Z, A>
where
    S: SessionRepository,
    P: PointerRepository,
    U: UserRepository,
    I: InferenceClient,
    Z: Summarizer,
    A: PatternAnalyzer,
{
    sessions: Arc<S>,
    pointers: P,
    users: U,
    inference: I,
    composer: ContextComposer<Z>,
    gate: TrialGate,
    milestones: MilestoneTrigger<S, A>,
    background: TaskTracker,
}

impl<S, P, U, I, Z, A> ChatService<S, P, U, I, Z, A>
where
    S: SessionRepository + 'static,
    P: PointerRepository,
    U: UserRepository,
    I: InferenceClient,
    Z: Summarizer,
    A: PatternAnalyzer + 'static,
{
    /// Create a service with the default trial cap and milestone interval.
    pub fn new(
        sessions: Arc<S>,
        pointers: P,
        users: U,
        inference: I,
        summarizer: Z,
        analyzer: Arc<A>,
    ) -> Self {
        let milestones = MilestoneTrigger::new(
            Arc::clone(&sessions),
            analyzer,
            MilestoneConfig::default().interval,
        );
        Self {
            sessions,
            pointers,
            users,
            inference,
            composer: ContextComposer::new(summarizer),
            gate: TrialGate::new(TrialConfig::default()),
            milestones,
            background: TaskTracker::new(),
        }
    }

    /// Override the trial cap and milestone interval.
    pub fn with_limits(mut self, trial: TrialConfig, milestones: MilestoneConfig) -> Self {
        self.gate = TrialGate::new(trial);
        self.milestones = self.milestones.with_interval(milestones.interval);
        self
    }

    /// Access the session repository.
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    // --- Turn pipeline ---

    /// Run one chat turn for `user_id`.
    #[tracing::instrument(
        name = "chat_turn",
        skip(self, request),
        fields(user_id = %user_id, session_id = ?request.session_id)
    )]
    pub async fn send_message(
        &self,
        user_id: Uuid,
        request: TurnRequest,
    ) -> Result<TurnOutcome, ChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::Validation("message must not be empty".to_string()));
        }

        let account = self
            .users
            .get_user(&user_id)
            .await?
            .ok_or(ChatError::Repository(RepositoryError::NotFound))?;

        let existing = self.resolve_target(&user_id, request.session_id).await?;

        if let GateDecision::Reject { end_trial } = self.gate.check(&account, existing.as_ref()) {
            if end_trial {
                match self.users.end_free_trial(&user_id).await {
                    Ok(()) => info!("Free trial ended at message cap"),
                    Err(e) => warn!(error = %e, "Failed to end free trial"),
                }
            }
            return Err(ChatError::QuotaExceeded);
        }

        // Lazily created sessions are persisted only after the model answers.
        let (session, is_new) = match existing {
            Some(session) => (session, false),
            None => (
                ChatSession::new(user_id, request.session_type.unwrap_or_default(), None),
                true,
            ),
        };

        let previous_token = match request.previous_continuation_token {
            Some(token) => Some(token),
            None => self
                .pointers
                .get_continuation(&user_id)
                .await?
                .map(|p| p.continuation_token),
        };

        let inference_request = self
            .composer
            .compose(&session, message, request.account_type, previous_token)
            .await;

        let reply = self.inference.infer(&inference_request).await?;

        if is_new {
            self.sessions.create_session(&session).await?;
            info!(session_id = %session.id, "Chat session created for first message");
        }

        let title = session
            .title
            .is_none()
            .then(|| derive_title(message, &reply.reply_text));
        let turn = [
            NewMessage::user(message, request.metadata),
            NewMessage::assistant(reply.reply_text.clone(), reply.continuation_id.clone()),
        ];
        let updated = self.append_turn(session, title.as_deref(), &turn).await?;

        if let Err(e) = self.users.increment_chat_count(&user_id).await {
            warn!(error = %e, "Failed to increment chat count");
        }
        if let Err(e) = self
            .pointers
            .upsert_continuation(&user_id, &reply.continuation_id)
            .await
        {
            warn!(error = %e, "Failed to update continuation pointer");
        }

        let count = updated.message_count();
        if self.milestones.is_milestone(count) && !updated.has_milestone(count) {
            let trigger = self.milestones.clone();
            let session_id = updated.id;
            self.background.spawn(async move {
                trigger.run_inline(user_id, session_id, count).await;
            });
        }

        Ok(TurnOutcome {
            reply: reply.reply_text,
            message_count: count,
            title: updated
                .title
                .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string()),
            continuation_token: reply.continuation_id,
            session_id: updated.id,
        })
    }

    /// The explicit session if given, else the user's latest active one.
    async fn resolve_target(
        &self,
        user_id: &Uuid,
        session_id: Option<Uuid>,
    ) -> Result<Option<ChatSession>, ChatError> {
        match session_id {
            Some(id) => self.owned_session(user_id, &id).await.map(Some),
            None => Ok(self.sessions.get_latest_active_session(user_id).await?),
        }
    }

    /// Append a turn, reloading and retrying on version conflicts.
    ///
    /// The inference reply is reused across attempts; the model is never
    /// called twice for one turn.
    async fn append_turn(
        &self,
        mut session: ChatSession,
        title: Option<&str>,
        turn: &[NewMessage],
    ) -> Result<ChatSession, ChatError> {
        let mut attempt = 1;
        loop {
            match self
                .sessions
                .append_messages(&session.id, session.version, title, turn)
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(RepositoryError::Conflict(reason)) if attempt < MAX_APPEND_ATTEMPTS => {
                    debug!(attempt, reason = %reason, "Append conflict, reloading session");
                    attempt += 1;
                    session = self
                        .sessions
                        .get_session(&session.id)
                        .await?
                        .ok_or(ChatError::SessionNotFound)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // --- Session lifecycle ---

    /// Start a fresh session, deactivating every other session of the user.
    pub async fn start_session(
        &self,
        user_id: Uuid,
        session_type: SessionType,
        title: Option<String>,
    ) -> Result<ChatSession, ChatError> {
        let deactivated = self.sessions.deactivate_user_sessions(&user_id).await?;
        let session = ChatSession::new(user_id, session_type, title);
        let created = self.sessions.create_session(&session).await?;
        info!(
            user_id = %user_id,
            session_id = %created.id,
            deactivated,
            "Chat session started"
        );
        Ok(created)
    }

    /// Deactivate a session and run pattern analysis over it if it has
    /// any messages. Analysis is awaited; its failure is logged only.
    #[tracing::instrument(name = "end_session", skip(self), fields(user_id = %user_id, session_id = %session_id))]
    pub async fn end_session(&self, user_id: Uuid, session_id: Uuid) -> Result<ChatSession, ChatError> {
        let session = self.owned_session(&user_id, &session_id).await?;
        self.sessions.deactivate_session(&session_id).await?;

        if session.message_count() > 0 {
            match self
                .milestones
                .run_unconditional(&user_id, &session_id)
                .await
            {
                Ok(_) => info!("Pattern analysis completed for ended session"),
                Err(e) => warn!(error = %e, "Pattern analysis failed for ended session"),
            }
        }

        self.owned_session(&user_id, &session_id).await
    }

    /// A session owned by the user.
    pub async fn get_session(&self, user_id: Uuid, session_id: Uuid) -> Result<ChatSession, ChatError> {
        self.owned_session(&user_id, &session_id).await
    }

    /// Ordered messages of a session owned by the user.
    pub async fn messages(&self, user_id: Uuid, session_id: Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.owned_session(&user_id, &session_id).await?.messages)
    }

    /// The user's most recently updated sessions.
    pub async fn recent_sessions(&self, user_id: Uuid) -> Result<Vec<SessionOverview>, ChatError> {
        let sessions = self
            .sessions
            .list_recent_sessions(&user_id, RECENT_SESSIONS_LIMIT)
            .await?;
        Ok(sessions.iter().map(SessionOverview::from).collect())
    }

    /// Set a session's summary. A summary can only be set once.
    pub async fn set_summary(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        summary: &str,
    ) -> Result<ChatSession, ChatError> {
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(ChatError::Validation("summary must not be empty".to_string()));
        }
        self.owned_session(&user_id, &session_id).await?;
        if !self.sessions.set_summary(&session_id, summary).await? {
            return Err(ChatError::SummaryAlreadySet);
        }
        self.owned_session(&user_id, &session_id).await
    }

    async fn owned_session(&self, user_id: &Uuid, session_id: &Uuid) -> Result<ChatSession, ChatError> {
        match self.sessions.get_session(session_id).await? {
            Some(session) if session.user_id == *user_id => Ok(session),
            _ => Err(ChatError::SessionNotFound),
        }
    }

    // --- Pointers ---

    /// The user's latest continuation token, shared across all sessions.
    pub async fn latest_continuation(&self, user_id: Uuid) -> Result<Option<String>, ChatError> {
        Ok(self
            .pointers
            .get_continuation(&user_id)
            .await?
            .map(|p| p.continuation_token))
    }

    /// Record which session the user was last viewing.
    pub async fn record_last_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        is_viewing_past_session: bool,
    ) -> Result<LastSessionPointer, ChatError> {
        self.owned_session(&user_id, &session_id).await?;
        let pointer = LastSessionPointer {
            user_id,
            session_id,
            is_viewing_past_session,
            updated_at: Utc::now(),
        };
        self.pointers.upsert_last_session(&pointer).await?;
        debug!(user_id = %user_id, session_id = %session_id, "Last session recorded");
        Ok(pointer)
    }

    /// The resumption pointer with its session loaded.
    pub async fn get_last_session(&self, user_id: Uuid) -> Result<LastSessionView, ChatError> {
        let pointer = self
            .pointers
            .get_last_session(&user_id)
            .await?
            .ok_or(ChatError::LastSessionNotFound)?;
        let session = self.owned_session(&user_id, &pointer.session_id).await?;
        Ok(LastSessionView { pointer, session })
    }

    // --- Background work ---

    /// Wait for every in-flight background task, then keep tracking new ones.
    #[cfg(test)]
    pub(crate) async fn wait_for_background(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    /// Wait for tracked turns and milestone analyses to finish.
    pub async fn shutdown(&self) {
        self.background.close();
        if !self.background.is_empty() {
            info!(tasks = self.background.len(), "Waiting for background work to finish");
        }
        self.background.wait().await;
    }
}

impl<S, P, U, I, Z, A> ChatService<S, P, U, I, Z, A>
where
    S: SessionRepository + 'static,
    P: PointerRepository + 'static,
    U: UserRepository + 'static,
    I: InferenceClient + 'static,
    Z: Summarizer + 'static,
    A: PatternAnalyzer + 'static,
{
    /// Run a chat turn as a tracked task.
    ///
    /// The turn runs to completion and is persisted even if the handle is
    /// dropped, e.g. when the HTTP client disconnects mid-request.
    pub fn spawn_turn(
        self: &Arc<Self>,
        user_id: Uuid,
        request: TurnRequest,
    ) -> JoinHandle<Result<TurnOutcome, ChatError>> {
        let service = Arc::clone(self);
        self.background
            .spawn(async move { service.send_message(user_id, request).await })
    }

    /// End a session as a tracked task, so deactivation and analysis finish
    /// even if the handle is dropped.
    pub fn spawn_end_session(
        self: &Arc<Self>,
        user_id: Uuid,
        session_id: Uuid,
    ) -> JoinHandle<Result<ChatSession, ChatError>> {
        let service = Arc::clone(self);
        self.background
            .spawn(async move { service.end_session(user_id, session_id).await })
    }
}
