//! Chat session orchestration for Sora.
//!
//! `ChatService` runs a turn end to end: trial gate, session resolution,
//! context composition, the inference call, the atomic append, the
//! continuation pointer update, and the milestone pattern trigger.

pub mod context;
pub mod milestone;
pub mod repository;
pub mod service;
pub mod title;
pub mod transcript;
pub mod trial;

#[cfg(test)]
pub(crate) mod testing;
