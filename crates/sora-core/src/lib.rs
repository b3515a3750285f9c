//! Business logic and port trait definitions for Sora.
//!
//! This crate defines the "ports" (repository and collaborator traits) that
//! the infrastructure layer implements, plus the chat orchestration built on
//! top of them. It depends only on `sora-types` -- never on `sora-infra` or
//! any database/HTTP crate.

pub mod chat;
pub mod collaborator;
pub mod repository;
