//! # Adapters
//!
//! In-memory implementations of the ledger ports.

pub mod memory_ledger;
pub mod payout_rail;

pub use memory_ledger::InMemoryLedger;
pub use payout_rail::InMemoryPayoutRail;
