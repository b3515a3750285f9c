//! Infrastructure layer for Sora.
//!
//! Contains implementations of the repository and collaborator traits
//! defined in `sora-core`: SQLite storage and the HTTP clients for the
//! external inference microservice, plus configuration loading.

pub mod config;
pub mod inference;
pub mod sqlite;
