//! Per-user pointer rows: the continuation chain and the resumption pointer.
//!
//! Both are single rows keyed by user id and overwritten on every write.

use sora_types::chat::{LastSessionPointer, ResponseChainPointer};
use sora_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for the two per-user pointer rows.
///
/// Implementations live in sora-infra (e.g., `SqlitePointerRepository`).
pub trait PointerRepository: Send + Sync {
    /// Overwrite the user's continuation token.
    fn upsert_continuation(
        &self,
        user_id: &Uuid,
        continuation_token: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The user's most recent continuation token, if any turn ever completed.
    fn get_continuation(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ResponseChainPointer>, RepositoryError>> + Send;

    /// Create or overwrite the user's resumption pointer.
    fn upsert_last_session(
        &self,
        pointer: &LastSessionPointer,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The user's resumption pointer, if one was ever recorded.
    fn get_last_session(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<LastSessionPointer>, RepositoryError>> + Send;
}
