//! Escrow engine configuration.

use ce_01_ledger::DEFAULT_MIN_WITHDRAWAL;
use serde::{Deserialize, Serialize};
use shared_types::Credits;

/// Escrow configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Response window used when the creator has not configured one (hours)
    pub default_response_window_hours: u32,
    /// Upper bound on any creator's response window (hours)
    pub max_response_window_hours: u32,
    /// Maximum characters per conversation entry
    pub max_content_chars: usize,
    /// Maximum characters per review
    pub max_review_chars: usize,
    /// Append the creator's welcome message to new regular messages
    pub welcome_messages_enabled: bool,
    /// Smallest amount a creator may withdraw
    pub min_withdrawal: Credits,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            default_response_window_hours: 48,
            max_response_window_hours: 168,
            max_content_chars: 4000,
            max_review_chars: 1000,
            welcome_messages_enabled: true,
            min_withdrawal: DEFAULT_MIN_WITHDRAWAL,
        }
    }
}

impl EscrowConfig {
    /// Clamp a creator's configured window to `[1, max]` hours.
    pub fn effective_window_hours(&self, configured: Option<u32>) -> u32 {
        configured
            .unwrap_or(self.default_response_window_hours)
            .clamp(1, self.max_response_window_hours.max(1))
    }
}
