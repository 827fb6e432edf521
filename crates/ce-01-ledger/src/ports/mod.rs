//! # Ports Module
//!
//! Hexagonal architecture ports for the Ledger.
//!
//! - **Inbound (Driving)**: `LedgerApi` - balance operations
//! - **Outbound (Driven)**: `PayoutRail` - off-platform transfers

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
