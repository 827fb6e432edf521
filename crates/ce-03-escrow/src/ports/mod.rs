//! # Ports Layer
//!
//! - **Inbound (Driving)**: `EscrowApi` - what callers can ask the engine to do
//! - **Outbound (Driven)**: profiles, notifications, file storage, clock

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
