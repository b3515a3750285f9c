//! `sora token` command.

use anyhow::Result;
use console::style;

use crate::http::extractors::auth::issue_token;
use crate::state::AppState;

/// Create `name` if missing and print a fresh access token once.
pub async fn issue(state: &AppState, name: &str, premium: bool, json: bool) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("user name must not be empty");
    }

    let (user, created) = match state.users.get_user_by_name(name).await? {
        Some(user) => (user, false),
        None => (state.users.create_user(name).await?, true),
    };
    if premium && !user.is_premium {
        state.users.set_premium(&user.id, true).await?;
    }

    let token = issue_token(&state.users, &user.id).await?;
    tracing::info!(user_id = %user.id, created, "Access token issued");

    if json {
        let out = serde_json::json!({
            "user_id": user.id,
            "name": user.name,
            "created": created,
            "premium": premium || user.is_premium,
            "token": token,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    if created {
        println!("  {} Created user '{}'", style("✓").green(), style(&user.name).cyan());
    }
    println!(
        "  {} Access token for '{}' (save this, it won't be shown again):",
        style("🔑").bold(),
        style(&user.name).cyan()
    );
    println!();
    println!("  {}", style(&token).yellow().bold());
    println!();

    Ok(())
}
