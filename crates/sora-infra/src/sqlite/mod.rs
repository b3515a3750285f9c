//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod pattern;
pub mod pointer;
pub mod pool;
pub mod session;
pub mod user;
