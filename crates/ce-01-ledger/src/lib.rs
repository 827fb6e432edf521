//! # CE-01 Ledger
//!
//! Per-account credit balances backing the escrow engine.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Guarantees
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | Balances never negative | `debit` fails with `InsufficientFunds` before mutating |
//! | Single writer per account | One mutex per account row |
//! | Transfers are all-or-nothing | Failed credit leg reverses the debit |
//! | Unmatched debits are fatal | Both accounts halted, `Corruption` returned and recorded |
//! | Withdrawals coupled to debits | Rail failure reverses the debit |
//!
//! ## Module Structure
//!
//! ```text
//! ce-01-ledger/
//! ├── domain/     # Account, JournalEntry, Withdrawal, LedgerError, invariants
//! ├── ports/      # LedgerApi, PayoutRail
//! ├── adapters/   # InMemoryLedger, InMemoryPayoutRail
//! └── service.rs  # WithdrawalService
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryLedger, InMemoryPayoutRail};
pub use domain::{
    Account, AccountStatus, CorruptionRecord, Direction, JournalEntry, LedgerError, LedgerResult,
    MovementReason, Withdrawal, WithdrawalStatus,
};
pub use ports::{LedgerApi, PayoutError, PayoutRail, PayoutReceipt, PayoutRequest};
pub use service::{WithdrawalService, DEFAULT_MIN_WITHDRAWAL};
