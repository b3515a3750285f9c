//! Chat session, message, and pointer types for Sora.
//!
//! These types model a user's conversations with the companion model:
//! sessions with their append-only message log, the per-user resumption
//! pointer, the per-user continuation pointer, and pattern reports
//! produced at message-count milestones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Title given to a session whose first exchange carries no usable text.
pub const DEFAULT_SESSION_TITLE: &str = "New Conversation";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// Category tag of a chat session.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (session_type IN ('general', 'crisis', 'clarity', 'checkin'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    General,
    Crisis,
    Clarity,
    Checkin,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::General => write!(f, "general"),
            SessionType::Crisis => write!(f, "crisis"),
            SessionType::Clarity => write!(f, "clarity"),
            SessionType::Checkin => write!(f, "checkin"),
        }
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(SessionType::General),
            "crisis" => Ok(SessionType::Crisis),
            "clarity" => Ok(SessionType::Clarity),
            "checkin" => Ok(SessionType::Checkin),
            other => Err(format!("invalid session type: '{other}'")),
        }
    }
}

/// Free-form annotations attached to a message by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
}

/// A message that has not been appended to a session yet.
///
/// The repository assigns the sequence index at append time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub role: MessageRole,
    pub content: String,
    pub continuation_token: Option<String>,
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    /// A user-authored message.
    pub fn user(content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            continuation_token: None,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// An assistant reply, tagged with the continuation token it produced.
    pub fn assistant(content: impl Into<String>, continuation_token: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            continuation_token: Some(continuation_token.into()),
            metadata: MessageMetadata::default(),
            created_at: Utc::now(),
        }
    }
}

/// A persisted message within a chat session.
///
/// Messages are ordered by `seq` (their index in the session), never by
/// wall-clock time. Once written, a message is never changed or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub seq: u32,
    pub role: MessageRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
    #[serde(default)]
    pub metadata: MessageMetadata,
    pub created_at: DateTime<Utc>,
}

/// A conversation thread belonging to one user.
///
/// `version` increments on every append and is used as the
/// compare-and-swap guard for concurrent turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub session_type: SessionType,
    pub is_active: bool,
    pub messages: Vec<ChatMessage>,
    pub summary: Option<String>,
    /// Message counts at which pattern analysis completed successfully.
    pub pattern_milestones: Vec<u32>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// A fresh, active, empty session.
    pub fn new(user_id: Uuid, session_type: SessionType, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            title,
            session_type,
            is_active: true,
            messages: Vec::new(),
            summary: None,
            pattern_milestones: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn message_count(&self) -> u32 {
        self.messages.len() as u32
    }

    pub fn has_milestone(&self, milestone: u32) -> bool {
        self.pattern_milestones.contains(&milestone)
    }
}

/// A session listing entry without the message bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOverview {
    pub id: Uuid,
    pub title: Option<String>,
    pub session_type: SessionType,
    pub is_active: bool,
    pub message_count: u32,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&ChatSession> for SessionOverview {
    fn from(session: &ChatSession) -> Self {
        Self {
            id: session.id,
            title: session.title.clone(),
            session_type: session.session_type,
            is_active: session.is_active,
            message_count: session.message_count(),
            summary: session.summary.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Which session a user was last looking at, restored on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSessionPointer {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub is_viewing_past_session: bool,
    pub updated_at: DateTime<Utc>,
}

/// A resumption pointer with its referenced session loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastSessionView {
    #[serde(flatten)]
    pub pointer: LastSessionPointer,
    pub session: ChatSession,
}

/// The most recent model continuation token for a user.
///
/// Keyed by user only: the token is shared across all of the user's
/// sessions, so a turn in one session continues from the last turn in any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseChainPointer {
    pub user_id: Uuid,
    pub continuation_token: String,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of an inline milestone analysis claim.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('claimed', 'completed', 'failed'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Claimed,
    Completed,
    Failed,
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilestoneStatus::Claimed => write!(f, "claimed"),
            MilestoneStatus::Completed => write!(f, "completed"),
            MilestoneStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for MilestoneStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claimed" => Ok(MilestoneStatus::Claimed),
            "completed" => Ok(MilestoneStatus::Completed),
            "failed" => Ok(MilestoneStatus::Failed),
            other => Err(format!("invalid milestone status: '{other}'")),
        }
    }
}

/// Output of one pattern-mining run over a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub patterns_text: String,
    pub created_at: DateTime<Utc>,
}
