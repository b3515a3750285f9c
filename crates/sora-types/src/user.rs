//! User-facing account types consumed by the chat orchestrator.
//!
//! Authentication and profile storage live outside this subsystem; only the
//! parts the orchestrator reads or mutates are modeled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::inference::InferenceMode;

/// The kind of account a user signed up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Individual,
    TherapyClient,
    Therapist,
}

impl AccountType {
    /// Individuals talk to the companion; everyone else gets coaching.
    pub fn inference_mode(&self) -> InferenceMode {
        match self {
            AccountType::Individual => InferenceMode::Companion,
            AccountType::TherapyClient | AccountType::Therapist => InferenceMode::Coaching,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Individual => write!(f, "individual"),
            AccountType::TherapyClient => write!(f, "therapy_client"),
            AccountType::Therapist => write!(f, "therapist"),
        }
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "individual" => Ok(AccountType::Individual),
            "therapy_client" => Ok(AccountType::TherapyClient),
            "therapist" => Ok(AccountType::Therapist),
            other => Err(format!("invalid account type: '{other}'")),
        }
    }
}

/// Free-tier usage state embedded on the user.
///
/// `is_free_trial` only ever moves from `true` to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialState {
    pub is_free_trial: bool,
    pub chat_count: u32,
}

impl Default for TrialState {
    fn default() -> Self {
        Self {
            is_free_trial: true,
            chat_count: 0,
        }
    }
}

/// The slice of a user account visible to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub is_premium: bool,
    pub trial: TrialState,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_mode() {
        assert_eq!(AccountType::Individual.inference_mode(), InferenceMode::Companion);
        assert_eq!(AccountType::TherapyClient.inference_mode(), InferenceMode::Coaching);
        assert_eq!(AccountType::Therapist.inference_mode(), InferenceMode::Coaching);
    }

    #[test]
    fn test_account_type_serde() {
        let json = serde_json::to_string(&AccountType::TherapyClient).unwrap();
        assert_eq!(json, "\"therapy_client\"");
        let parsed: AccountType = "therapist".parse().unwrap();
        assert_eq!(parsed, AccountType::Therapist);
    }

    #[test]
    fn test_trial_state_default_is_fresh_trial() {
        let trial = TrialState::default();
        assert!(trial.is_free_trial);
        assert_eq!(trial.chat_count, 0);
    }
}
