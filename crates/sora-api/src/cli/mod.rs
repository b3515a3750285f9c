//! CLI command definitions for the `sora` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod status;
pub mod token;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Conversation session orchestrator for the Sora support app.
#[derive(Parser)]
#[command(name = "sora", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Data directory holding `sora.db` and `config.toml`.
    #[arg(long, global = true, env = "SORA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(long, short, default_value = "3000", env = "SORA_PORT")]
        port: u16,

        /// Host address to bind to.
        #[arg(long, default_value = "127.0.0.1", env = "SORA_HOST")]
        host: String,
    },

    /// Issue an access token for a user, creating the user if needed.
    Token {
        /// User name.
        #[arg(long, short)]
        user: String,

        /// Mark the user as premium (bypasses the free-trial limit).
        #[arg(long)]
        premium: bool,
    },

    /// Show system status.
    Status,
}
