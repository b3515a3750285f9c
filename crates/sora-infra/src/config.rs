//! Service configuration loader for Sora.
//!
//! Reads `config.toml` from the data directory (`~/.sora/` in production)
//! and deserializes it into [`ServiceConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use sora_types::config::ServiceConfig;

/// Environment variable overriding every collaborator base URL.
pub const INFERENCE_URL_ENV: &str = "SORA_INFERENCE_URL";

/// Load service configuration from `{data_dir}/config.toml`, then apply
/// the `SORA_INFERENCE_URL` override.
///
/// - If the file does not exist, starts from [`ServiceConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and uses the default.
pub async fn load_config(data_dir: &Path) -> ServiceConfig {
    let config = read_config_file(data_dir).await;
    let override_url = std::env::var(INFERENCE_URL_ENV).ok();
    apply_inference_override(config, override_url.as_deref())
}

async fn read_config_file(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}

/// Point all collaborators at `url` when it is set and non-empty.
pub fn apply_inference_override(config: ServiceConfig, url: Option<&str>) -> ServiceConfig {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            tracing::debug!(url, "Using {INFERENCE_URL_ENV} for all collaborators");
            config.with_base_url(url)
        }
        None => config,
    }
}

/// `~/.sora`, or `./.sora` when no home directory is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sora")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sora_types::config::DEFAULT_INFERENCE_URL;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.trial.message_cap, 5);
        assert_eq!(config.inference.base_url, DEFAULT_INFERENCE_URL);
    }

    #[tokio::test]
    async fn read_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[inference]
base_url = "http://inference.internal:5050"

[milestones]
interval = 20
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.inference.base_url, "http://inference.internal:5050");
        assert_eq!(config.milestones.interval, 20);
        assert_eq!(config.summarizer.base_url, DEFAULT_INFERENCE_URL);
    }

    #[tokio::test]
    async fn read_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = read_config_file(tmp.path()).await;
        assert_eq!(config.milestones.interval, 40);
    }

    #[test]
    fn inference_override_applies_to_all_collaborators() {
        let config = apply_inference_override(ServiceConfig::default(), Some("http://10.1.1.1:5000"));
        assert_eq!(config.inference.base_url, "http://10.1.1.1:5000");
        assert_eq!(config.summarizer.base_url, "http://10.1.1.1:5000");
        assert_eq!(config.patterns.base_url, "http://10.1.1.1:5000");
    }

    #[test]
    fn blank_inference_override_is_ignored() {
        let config = apply_inference_override(ServiceConfig::default(), Some("  "));
        assert_eq!(config.inference.base_url, DEFAULT_INFERENCE_URL);
        let config = apply_inference_override(ServiceConfig::default(), None);
        assert_eq!(config.inference.base_url, DEFAULT_INFERENCE_URL);
    }

    #[test]
    fn default_data_dir_ends_with_sora() {
        assert!(default_data_dir().ends_with(".sora"));
    }
}
