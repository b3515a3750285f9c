//! Free-tier message cap enforcement.
//!
//! The gate runs before any external call, so a rejected turn costs nothing
//! on the inference side. Rejection on a full session also ends the free
//! trial; that transition is one-way.

use sora_types::chat::ChatSession;
use sora_types::config::TrialConfig;
use sora_types::user::UserAccount;

/// Result of checking a turn against the free-tier cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    /// Reject the turn. `end_trial` is set when the caller must flip
    /// `is_free_trial` to false as a side effect.
    Reject { end_trial: bool },
}

/// Enforces the free-tier message cap.
#[derive(Debug, Clone, Copy)]
pub struct TrialGate {
    message_cap: u32,
}

impl TrialGate {
    pub fn new(config: TrialConfig) -> Self {
        Self {
            message_cap: config.message_cap,
        }
    }

    pub fn message_cap(&self) -> u32 {
        self.message_cap
    }

    /// Decide whether a turn may proceed.
    ///
    /// - Premium accounts are never gated.
    /// - A session already holding `message_cap` or more messages rejects
    ///   the turn, ending the trial if it is still running.
    /// - A user whose trial already ended is rejected outright.
    pub fn check(&self, account: &UserAccount, session: Option<&ChatSession>) -> GateDecision {
        if account.is_premium {
            return GateDecision::Allow;
        }

        let session_full = session
            .map(|s| s.message_count() >= self.message_cap)
            .unwrap_or(false);

        if session_full {
            return GateDecision::Reject {
                end_trial: account.trial.is_free_trial,
            };
        }

        if !account.trial.is_free_trial {
            return GateDecision::Reject { end_trial: false };
        }

        GateDecision::Allow
    }
}
