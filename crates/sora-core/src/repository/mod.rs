//! Repository trait definitions (ports).
//!
//! These traits define the per-user storage interface that the
//! infrastructure layer (sora-infra) implements. Session storage lives in
//! [`crate::chat::repository`].

pub mod pattern;
pub mod pointer;
pub mod user;
