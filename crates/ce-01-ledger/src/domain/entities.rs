//! # Domain Entities
//!
//! Accounts, journal entries and withdrawals.

use super::errors::LedgerResult;
use super::invariants::{invariant_active, invariant_no_overflow, invariant_sufficient_funds};
use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Credits, Timestamp, WithdrawalId};

/// Account health.
///
/// ```text
/// [ACTIVE] ──unmatched debit──→ [HALTED]
///     ↑                             │
///     └──── manual reconciliation ──┘
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    /// Normal operation.
    #[default]
    Active,
    /// Every mutation is refused until an operator resumes the account.
    Halted {
        /// Why the account was halted.
        reason: String,
    },
}

/// A credit account. Balance changes only through debit and credit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identity.
    pub id: AccountId,
    /// Current balance. Never negative.
    pub balance: Credits,
    /// Health state.
    pub status: AccountStatus,
}

impl Account {
    /// Open an account with an initial balance.
    pub fn new(id: AccountId, balance: Credits) -> Self {
        Self {
            id,
            balance,
            status: AccountStatus::Active,
        }
    }

    /// Whether mutations are currently refused.
    pub fn is_halted(&self) -> bool {
        matches!(self.status, AccountStatus::Halted { .. })
    }

    /// Decrement the balance. Fails before mutating anything.
    pub fn apply_debit(&mut self, amount: Credits) -> LedgerResult<Credits> {
        invariant_active(self)?;
        invariant_sufficient_funds(self, amount)?;
        self.balance -= amount;
        Ok(self.balance)
    }

    /// Increment the balance. Fails before mutating anything.
    pub fn apply_credit(&mut self, amount: Credits) -> LedgerResult<Credits> {
        invariant_active(self)?;
        self.balance = invariant_no_overflow(self, amount)?;
        Ok(self.balance)
    }

    /// Refuse further mutation.
    pub fn halt(&mut self, reason: impl Into<String>) {
        self.status = AccountStatus::Halted {
            reason: reason.into(),
        };
    }
}

/// Why credits moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementReason {
    /// Credits entering the platform.
    Deposit,
    /// Sender debited when a timed message is created.
    EscrowHold,
    /// Creator paid when a message is replied.
    Settlement,
    /// Sender refunded on cancel or expiry.
    Refund,
    /// Instant transfer for a product or tip.
    Purchase,
    /// Creator balance moved off-platform.
    Withdrawal,
    /// Withdrawal debit returned after a payout failure.
    WithdrawalReversal,
    /// Debit returned after its paired credit failed.
    Compensation,
}

/// Debit or credit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Balance decreased.
    Debit,
    /// Balance increased.
    Credit,
}

/// One applied balance change. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Global application order.
    pub sequence: u64,
    /// Affected account.
    pub account: AccountId,
    /// Debit or credit.
    pub direction: Direction,
    /// Credits moved.
    pub amount: Credits,
    /// Why they moved.
    pub reason: MovementReason,
    /// Balance after the change.
    pub balance_after: Credits,
}

/// A debit left without its paired credit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionRecord {
    /// Account that was debited.
    pub debited: AccountId,
    /// Account that should have been credited.
    pub intended: AccountId,
    /// Unmatched credits.
    pub amount: Credits,
    /// Original movement reason.
    pub reason: MovementReason,
    /// Operator-facing description.
    pub detail: String,
}

/// Withdrawal outcome. Records are immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WithdrawalStatus {
    /// Payout rail accepted the transfer.
    Completed {
        /// Rail reference for reconciliation.
        payout_reference: String,
    },
    /// Payout rail refused; the debit was reversed.
    Failed {
        /// Rail error.
        reason: String,
    },
}

/// A creator's transfer of balance to the external payout rail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Unique identifier.
    pub id: WithdrawalId,
    /// Withdrawing creator.
    pub creator: AccountId,
    /// Credits withdrawn.
    pub amount: Credits,
    /// Outcome.
    pub status: WithdrawalStatus,
    /// Request time.
    pub requested_at: Timestamp,
}

impl Withdrawal {
    /// Whether credits actually left the platform.
    pub fn is_completed(&self) -> bool {
        matches!(self.status, WithdrawalStatus::Completed { .. })
    }
}
