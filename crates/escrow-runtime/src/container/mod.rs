//! # Engine Container
//!
//! Holds the escrow engine and every adapter it was built from.
//!
//! - The ledger and message store are shared by `Arc` with the engine
//! - Outbound adapters are in-memory; the bus is the only path out

pub mod config;
pub mod engine;

pub use config::{ConfigError, RuntimeConfig};
pub use engine::{EngineContainer, EscrowEngine};
