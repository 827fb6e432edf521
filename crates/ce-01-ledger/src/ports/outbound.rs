//! # Outbound Ports
//!
//! Dependencies the Ledger drives.

use async_trait::async_trait;
use shared_types::{AccountId, Credits, WithdrawalId};
use thiserror::Error;

/// A request to move creator credits off-platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutRequest {
    /// Withdrawal record this payout belongs to.
    pub withdrawal_id: WithdrawalId,
    /// Receiving creator.
    pub creator: AccountId,
    /// Credits to pay out.
    pub amount: Credits,
}

/// Rail acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayoutReceipt {
    /// External reference for reconciliation.
    pub reference: String,
}

/// Payout rail failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PayoutError {
    /// The rail refused the payout (e.g. no connected bank account).
    #[error("Payout rejected: {0}")]
    Rejected(String),

    /// The rail could not be reached.
    #[error("Payout rail unavailable: {0}")]
    Unavailable(String),
}

/// External payout rail (card processor or bank transfer).
#[async_trait]
pub trait PayoutRail: Send + Sync {
    /// Send credits to the creator's external account.
    async fn send_payout(&self, request: PayoutRequest) -> Result<PayoutReceipt, PayoutError>;
}
