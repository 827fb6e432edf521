//! # Ports Module
//!
//! - **Inbound (Driving)**: `MessageStore` - persistence contract used by the escrow engine

pub mod inbound;

pub use inbound::*;
