//! SessionRepository trait definition.
//!
//! Typed operations over the chat session entity: creation, lookup,
//! activation state, the atomic two-message append, the set-once summary,
//! and inline milestone claims.

use sora_types::chat::{ChatSession, MilestoneStatus, NewMessage};
use sora_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session persistence.
///
/// Implementations live in sora-infra (e.g., `SqliteSessionRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Sessions are returned fully loaded: ordered messages and the set of
/// completed pattern milestones.
pub trait SessionRepository: Send + Sync {
    /// Create a new chat session. Does not touch sibling sessions.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a chat session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// The most recently created active session for a user.
    fn get_latest_active_session(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Sessions for a user, most recently updated first.
    fn list_recent_sessions(
        &self,
        user_id: &Uuid,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Sessions for a user, most recently created first.
    fn list_sessions_by_creation(
        &self,
        user_id: &Uuid,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Mark every session of a user inactive. Returns the number changed.
    fn deactivate_user_sessions(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Mark a single session inactive.
    fn deactivate_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append messages to the end of a session in one atomic update.
    ///
    /// Succeeds only if the stored version still equals `expected_version`;
    /// otherwise returns `RepositoryError::Conflict` and writes nothing.
    /// `title` is applied only when the session has no title yet.
    fn append_messages(
        &self,
        session_id: &Uuid,
        expected_version: u64,
        title: Option<&str>,
        messages: &[NewMessage],
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Set the summary if none exists. Returns false if one was already set.
    fn set_summary(
        &self,
        session_id: &Uuid,
        summary: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Claim a milestone for inline analysis.
    ///
    /// Returns true only for the first claimant of `(session_id, milestone)`.
    fn claim_milestone(
        &self,
        session_id: &Uuid,
        milestone: u32,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Record how a claimed milestone ended.
    fn finish_milestone(
        &self,
        session_id: &Uuid,
        milestone: u32,
        status: MilestoneStatus,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
