//! Sora CLI and REST API entry point.
//!
//! Binary name: `sora`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

use clap::Parser;

use sora_api::cli::{self, Cli, Commands};
use sora_api::http;
use sora_api::state::AppState;
use sora_infra::config::default_data_dir;
use sora_observe::tracing_setup::{LogOptions, init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_options = LogOptions {
        otel: cli.otel,
        ..LogOptions::from_verbosity(cli.verbose, cli.quiet)
    };
    if let Err(e) = init_tracing(&log_options) {
        eprintln!("Warning: tracing setup failed: {e}");
    }

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let state = AppState::init(&data_dir).await?;

    let result = match cli.command {
        Commands::Serve { port, host } => serve(state, &host, port).await,
        Commands::Token { user, premium } => cli::token::issue(&state, &user, premium, cli.json).await,
        Commands::Status => cli::status::status(&state, cli.json).await,
    };

    shutdown_tracing();
    result
}

async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Sora API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let chat = state.chat.clone();
    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight milestone analyses finish before the process exits.
    chat.shutdown().await;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
