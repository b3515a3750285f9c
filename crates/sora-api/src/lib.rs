//! Sora application layer: CLI commands, the REST API, and the wiring
//! that pins the orchestrator to its SQLite and HTTP adapters.

pub mod cli;
pub mod http;
pub mod state;
