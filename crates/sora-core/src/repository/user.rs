//! UserRepository trait definition.
//!
//! The orchestrator treats users as an external concern; it only reads
//! the account and mutates the embedded trial state.

use sora_types::error::RepositoryError;
use sora_types::user::UserAccount;
use uuid::Uuid;

/// Repository trait for the trial-related slice of a user account.
pub trait UserRepository: Send + Sync {
    /// Get a user account by its unique ID.
    fn get_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<UserAccount>, RepositoryError>> + Send;

    /// Flip `is_free_trial` to false. There is no operation to flip it back.
    fn end_free_trial(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically increment `chat_count`, returning the new value.
    fn increment_chat_count(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;
}
