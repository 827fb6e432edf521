//! # Inbound Ports
//!
//! API trait defining what the Ledger can do.

use crate::domain::{Account, CorruptionRecord, JournalEntry, LedgerResult, MovementReason};
use shared_types::{AccountId, Credits};

/// Ledger API - inbound port.
///
/// Each account is mutated by one writer at a time. Operations are short and
/// synchronous so callers may invoke them while holding their own row locks.
pub trait LedgerApi: Send + Sync {
    /// Open an account with an opening balance.
    fn open_account(&self, account: AccountId, opening_balance: Credits) -> LedgerResult<()>;

    /// Snapshot of an account.
    fn account(&self, account: AccountId) -> LedgerResult<Account>;

    /// Current balance.
    fn balance(&self, account: AccountId) -> LedgerResult<Credits> {
        self.account(account).map(|a| a.balance)
    }

    /// Decrement a balance. Fails with `InsufficientFunds` rather than going negative.
    ///
    /// Returns the new balance.
    fn debit(&self, account: AccountId, amount: Credits, reason: MovementReason)
        -> LedgerResult<Credits>;

    /// Increment a balance.
    ///
    /// Returns the new balance.
    fn credit(
        &self,
        account: AccountId,
        amount: Credits,
        reason: MovementReason,
    ) -> LedgerResult<Credits>;

    /// Debit `from` and credit `to` as one unit.
    ///
    /// If the credit fails the debit is reversed. If the reversal also fails
    /// both accounts are halted and `Corruption` is returned.
    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Credits,
        reason: MovementReason,
    ) -> LedgerResult<()>;

    /// Credits entering the platform (top-up).
    fn deposit(&self, account: AccountId, amount: Credits) -> LedgerResult<Credits> {
        self.credit(account, amount, MovementReason::Deposit)
    }

    /// Freeze an account pending manual reconciliation.
    fn halt_account(&self, account: AccountId, reason: &str) -> LedgerResult<()>;

    /// Operator action: unfreeze a halted account.
    fn resume_account(&self, account: AccountId) -> LedgerResult<()>;

    /// Sum of all balances.
    fn total_balance(&self) -> Credits;

    /// Movements applied to one account, oldest first.
    fn journal(&self, account: AccountId) -> Vec<JournalEntry>;

    /// Unmatched debits awaiting manual reconciliation.
    fn corruption_records(&self) -> Vec<CorruptionRecord>;
}
