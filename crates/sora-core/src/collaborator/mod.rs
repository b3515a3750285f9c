//! External collaborator traits (ports).
//!
//! The inference service is a hard dependency of a turn; the summarizer
//! and the pattern analyzer are best-effort. Implementations live in
//! sora-infra.

pub mod inference;
pub mod patterns;
pub mod summarizer;
