//! Shared domain types for Sora.
//!
//! This crate contains the domain types used across the Sora chat
//! orchestrator: chat sessions and messages, resumption and continuation
//! pointers, trial state, inference request/reply shapes, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod inference;
pub mod user;
