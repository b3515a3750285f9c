//! Service configuration types for Sora.
//!
//! `ServiceConfig` represents the top-level `config.toml` that points the
//! orchestrator at its external collaborators and sets the trial and
//! milestone thresholds. Every field has a default.

use secrecy::SecretString;
use serde::Deserialize;

/// Default base URL of the inference microservice.
pub const DEFAULT_INFERENCE_URL: &str = "http://127.0.0.1:5050";

/// Top-level configuration for the orchestrator.
///
/// Loaded from `~/.sora/config.toml`.
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "EndpointConfig::inference")]
    pub inference: EndpointConfig,

    #[serde(default = "EndpointConfig::summarizer")]
    pub summarizer: EndpointConfig,

    #[serde(default = "EndpointConfig::patterns")]
    pub patterns: EndpointConfig,

    #[serde(default)]
    pub trial: TrialConfig,

    #[serde(default)]
    pub milestones: MilestoneConfig,

    #[serde(default)]
    pub summary: SummaryWindowConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            inference: EndpointConfig::inference(),
            summarizer: EndpointConfig::summarizer(),
            patterns: EndpointConfig::patterns(),
            trial: TrialConfig::default(),
            milestones: MilestoneConfig::default(),
            summary: SummaryWindowConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Point every collaborator at the same host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.inference.base_url = base_url.to_string();
        self.summarizer.base_url = base_url.to_string();
        self.patterns.base_url = base_url.to_string();
        self
    }
}

/// Where and how to reach one external collaborator.
#[derive(Debug, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sent as a bearer token when present. Never logged.
    #[serde(default)]
    pub api_key: Option<SecretString>,
}

impl EndpointConfig {
    fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs,
            api_key: None,
        }
    }

    pub fn inference() -> Self {
        Self::with_timeout(60)
    }

    pub fn summarizer() -> Self {
        Self::with_timeout(30)
    }

    pub fn patterns() -> Self {
        Self::with_timeout(120)
    }
}

fn default_base_url() -> String {
    DEFAULT_INFERENCE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Free-tier limits.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrialConfig {
    /// Existing messages in a session at which free users are cut off.
    #[serde(default = "default_message_cap")]
    pub message_cap: u32,
}

fn default_message_cap() -> u32 {
    5
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            message_cap: default_message_cap(),
        }
    }
}

/// Pattern analysis scheduling.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MilestoneConfig {
    /// Message-count interval at which inline analysis fires.
    #[serde(default = "default_milestone_interval")]
    pub interval: u32,
}

fn default_milestone_interval() -> u32 {
    40
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            interval: default_milestone_interval(),
        }
    }
}

/// Window of history fed to the cross-session summarizer.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SummaryWindowConfig {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u32,

    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_sessions() -> u32 {
    20
}

fn default_max_chars() -> usize {
    8000
}

impl Default for SummaryWindowConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            max_chars: default_max_chars(),
        }
    }
}
