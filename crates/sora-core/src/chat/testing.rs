//! In-memory repositories and collaborators for orchestrator tests.
//!
//! Every mock keeps its state behind `Arc<Mutex<_>>` so a test can hold a
//! clone and inspect what the service did.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use sora_types::chat::{
    ChatMessage, ChatSession, LastSessionPointer, MessageMetadata, MessageRole, MilestoneStatus,
    NewMessage, ResponseChainPointer, SessionType,
};
use sora_types::error::RepositoryError;
use sora_types::inference::{InferenceError, InferenceReply, InferenceRequest};
use sora_types::user::{TrialState, UserAccount};
use uuid::Uuid;

use crate::chat::repository::SessionRepository;
use crate::collaborator::inference::InferenceClient;
use crate::collaborator::patterns::PatternAnalyzer;
use crate::collaborator::summarizer::Summarizer;
use crate::repository::pointer::PointerRepository;
use crate::repository::user::UserRepository;

pub fn account(is_premium: bool, is_free_trial: bool) -> UserAccount {
    UserAccount {
        id: Uuid::now_v7(),
        name: "tester".to_string(),
        is_premium,
        trial: TrialState {
            is_free_trial,
            chat_count: 0,
        },
        created_at: Utc::now(),
    }
}

/// An active session holding `count` alternating user/assistant messages.
pub fn session_with_messages(user_id: Uuid, count: u32) -> ChatSession {
    let mut session = ChatSession::new(user_id, SessionType::General, None);
    for seq in 0..count {
        let role = if seq % 2 == 0 {
            MessageRole::User
        } else {
            MessageRole::Assistant
        };
        session.messages.push(ChatMessage {
            seq,
            role,
            content: format!("message {seq}"),
            continuation_token: (role == MessageRole::Assistant).then(|| format!("seed_{seq}")),
            metadata: MessageMetadata::default(),
            created_at: Utc::now(),
        });
    }
    session.version = u64::from(count.div_ceil(2));
    session
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SessionState {
    sessions: HashMap<Uuid, ChatSession>,
    claims: HashMap<(Uuid, u32), MilestoneStatus>,
    conflicts_remaining: u32,
    append_calls: u32,
    deactivate_user_calls: u32,
}

#[derive(Clone, Default)]
pub struct MockSessions {
    state: Arc<Mutex<SessionState>>,
}

impl MockSessions {
    pub fn insert(&self, session: ChatSession) {
        self.state
            .lock()
            .unwrap()
            .sessions
            .insert(session.id, session);
    }

    pub fn session(&self, id: &Uuid) -> Option<ChatSession> {
        self.state.lock().unwrap().sessions.get(id).cloned()
    }

    pub fn all_for(&self, user_id: &Uuid) -> Vec<ChatSession> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .values()
            .filter(|s| s.user_id == *user_id)
            .cloned()
            .collect()
    }

    /// Make the next `n` appends fail with a version conflict.
    pub fn inject_conflicts(&self, n: u32) {
        self.state.lock().unwrap().conflicts_remaining = n;
    }

    pub fn append_calls(&self) -> u32 {
        self.state.lock().unwrap().append_calls
    }

    pub fn deactivate_user_calls(&self) -> u32 {
        self.state.lock().unwrap().deactivate_user_calls
    }

    pub fn claim_status(&self, session_id: &Uuid, milestone: u32) -> Option<MilestoneStatus> {
        self.state
            .lock()
            .unwrap()
            .claims
            .get(&(*session_id, milestone))
            .copied()
    }
}

impl SessionRepository for MockSessions {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.sessions.contains_key(&session.id) {
            return Err(RepositoryError::Conflict("session exists".to_string()));
        }
        state.sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self.session(session_id))
    }

    async fn get_latest_active_session(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .all_for(user_id)
            .into_iter()
            .filter(|s| s.is_active)
            .max_by_key(|s| (s.created_at, s.id)))
    }

    async fn list_recent_sessions(
        &self,
        user_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut sessions = self.all_for(user_id);
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(limit as usize);
        Ok(sessions)
    }

    async fn list_sessions_by_creation(
        &self,
        user_id: &Uuid,
        limit: u32,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let mut sessions = self.all_for(user_id);
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.truncate(limit as usize);
        Ok(sessions)
    }

    async fn deactivate_user_sessions(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.deactivate_user_calls += 1;
        let mut changed = 0;
        for session in state.sessions.values_mut() {
            if session.user_id == *user_id && session.is_active {
                session.is_active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn deactivate_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(RepositoryError::NotFound)?;
        session.is_active = false;
        Ok(())
    }

    async fn append_messages(
        &self,
        session_id: &Uuid,
        expected_version: u64,
        title: Option<&str>,
        messages: &[NewMessage],
    ) -> Result<ChatSession, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.append_calls += 1;
        if state.conflicts_remaining > 0 {
            state.conflicts_remaining -= 1;
            return Err(RepositoryError::Conflict("version changed".to_string()));
        }
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(RepositoryError::NotFound)?;
        if session.version != expected_version {
            return Err(RepositoryError::Conflict("version changed".to_string()));
        }
        for message in messages {
            let seq = session.message_count();
            session.messages.push(ChatMessage {
                seq,
                role: message.role,
                content: message.content.clone(),
                continuation_token: message.continuation_token.clone(),
                metadata: message.metadata.clone(),
                created_at: message.created_at,
            });
        }
        if session.title.is_none() {
            session.title = title.map(str::to_string);
        }
        session.version += 1;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn set_summary(&self, session_id: &Uuid, summary: &str) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(RepositoryError::NotFound)?;
        if session.summary.is_some() {
            return Ok(false);
        }
        session.summary = Some(summary.to_string());
        Ok(true)
    }

    async fn claim_milestone(&self, session_id: &Uuid, milestone: u32) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.claims.contains_key(&(*session_id, milestone)) {
            return Ok(false);
        }
        state
            .claims
            .insert((*session_id, milestone), MilestoneStatus::Claimed);
        Ok(true)
    }

    async fn finish_milestone(
        &self,
        session_id: &Uuid,
        milestone: u32,
        status: MilestoneStatus,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.claims.insert((*session_id, milestone), status);
        if status == MilestoneStatus::Completed {
            if let Some(session) = state.sessions.get_mut(session_id) {
                if !session.pattern_milestones.contains(&milestone) {
                    session.pattern_milestones.push(milestone);
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Default)]
struct UserState {
    users: HashMap<Uuid, UserAccount>,
    fail_increment: bool,
}

#[derive(Clone, Default)]
pub struct MockUsers {
    state: Arc<Mutex<UserState>>,
}

impl MockUsers {
    pub fn insert(&self, user: UserAccount) {
        self.state.lock().unwrap().users.insert(user.id, user);
    }

    pub fn user(&self, id: &Uuid) -> Option<UserAccount> {
        self.state.lock().unwrap().users.get(id).cloned()
    }

    pub fn fail_increment(&self) {
        self.state.lock().unwrap().fail_increment = true;
    }
}

impl UserRepository for MockUsers {
    async fn get_user(&self, user_id: &Uuid) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.user(user_id))
    }

    async fn end_free_trial(&self, user_id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .get_mut(user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.trial.is_free_trial = false;
        Ok(())
    }

    async fn increment_chat_count(&self, user_id: &Uuid) -> Result<u32, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_increment {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        let user = state
            .users
            .get_mut(user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.trial.chat_count += 1;
        Ok(user.trial.chat_count)
    }
}

// ---------------------------------------------------------------------------
// Pointers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PointerState {
    continuation: HashMap<Uuid, ResponseChainPointer>,
    last: HashMap<Uuid, LastSessionPointer>,
    fail_continuation: bool,
}

#[derive(Clone, Default)]
pub struct MockPointers {
    state: Arc<Mutex<PointerState>>,
}

impl MockPointers {
    pub fn continuation(&self, user_id: &Uuid) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .continuation
            .get(user_id)
            .map(|p| p.continuation_token.clone())
    }

    pub fn fail_continuation(&self) {
        self.state.lock().unwrap().fail_continuation = true;
    }
}

impl PointerRepository for MockPointers {
    async fn upsert_continuation(
        &self,
        user_id: &Uuid,
        continuation_token: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_continuation {
            return Err(RepositoryError::Connection);
        }
        state.continuation.insert(
            *user_id,
            ResponseChainPointer {
                user_id: *user_id,
                continuation_token: continuation_token.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_continuation(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<ResponseChainPointer>, RepositoryError> {
        Ok(self.state.lock().unwrap().continuation.get(user_id).cloned())
    }

    async fn upsert_last_session(&self, pointer: &LastSessionPointer) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .unwrap()
            .last
            .insert(pointer.user_id, pointer.clone());
        Ok(())
    }

    async fn get_last_session(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<LastSessionPointer>, RepositoryError> {
        Ok(self.state.lock().unwrap().last.get(user_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InferenceState {
    requests: Vec<InferenceRequest>,
    fail: bool,
    delay: Option<Duration>,
}

/// Replies `reply N` with continuation id `resp_N`, N counting from 1.
#[derive(Clone, Default)]
pub struct MockInference {
    state: Arc<Mutex<InferenceState>>,
}

impl MockInference {
    pub fn set_failing(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

impl InferenceClient for MockInference {
    async fn infer(&self, request: &InferenceRequest) -> Result<InferenceReply, InferenceError> {
        let (n, fail, delay) = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            (state.requests.len(), state.fail, state.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(InferenceError::Timeout);
        }
        Ok(InferenceReply {
            reply_text: format!("reply {n}"),
            continuation_id: format!("resp_{n}"),
        })
    }
}

#[derive(Clone)]
pub struct MockSummarizer {
    result: Result<String, String>,
}

impl MockSummarizer {
    pub fn ok(summary: &str) -> Self {
        Self {
            result: Ok(summary.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: Err("summarizer offline".to_string()),
        }
    }
}

impl Summarizer for MockSummarizer {
    async fn summarize(&self, _user_id: &Uuid) -> Result<String, InferenceError> {
        self.result.clone().map_err(InferenceError::Transport)
    }
}

#[derive(Default)]
struct AnalyzerState {
    calls: Vec<(Uuid, Uuid)>,
    fail: bool,
    delay: Option<Duration>,
}

#[derive(Clone, Default)]
pub struct MockAnalyzer {
    state: Arc<Mutex<AnalyzerState>>,
}

impl MockAnalyzer {
    pub fn set_failing(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<(Uuid, Uuid)> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl PatternAnalyzer for MockAnalyzer {
    async fn analyze(&self, user_id: &Uuid, session_id: &Uuid) -> Result<String, InferenceError> {
        let (fail, delay) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push((*user_id, *session_id));
            (state.fail, state.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(InferenceError::Status {
                status: 500,
                body: "pattern model crashed".to_string(),
            });
        }
        Ok("tends to ruminate in the evening".to_string())
    }
}
