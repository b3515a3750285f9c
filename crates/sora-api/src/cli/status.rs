//! System status command.

use anyhow::Result;
use console::style;

use sora_infra::config::load_config;

use crate::state::AppState;

/// Display data directory, user count, and collaborator endpoints.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.users.count_users().await?;
    let config = load_config(&state.data_dir).await;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": users,
            "inference_url": config.inference.base_url,
            "summarizer_url": config.summarizer.base_url,
            "patterns_url": config.patterns.base_url,
            "trial_message_cap": config.trial.message_cap,
            "milestone_interval": config.milestones.interval,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} Sora v{}", style("⚡").bold(), env!("CARGO_PKG_VERSION"));
    println!();
    println!("  {}", style("── Storage ──").dim());
    println!("  Data dir:   {}", state.data_dir.display());
    println!("  Users:      {}", style(users).bold());
    println!();
    println!("  {}", style("── Collaborators ──").dim());
    println!("  Inference:  {}", style(&config.inference.base_url).cyan());
    println!("  Summarizer: {}", style(&config.summarizer.base_url).cyan());
    println!("  Patterns:   {}", style(&config.patterns.base_url).cyan());
    println!();
    println!("  {}", style("── Limits ──").dim());
    println!("  Trial cap:  {} messages", config.trial.message_cap);
    println!("  Milestones: every {} messages", config.milestones.interval);
    println!();

    Ok(())
}
