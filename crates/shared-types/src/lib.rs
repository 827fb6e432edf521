//! # Shared Types Crate
//!
//! Identifiers and value types shared by the escrow subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: ids, credit amounts and timestamps are
//!   defined once here and never redefined by a subsystem.
//! - **Explicit Actors**: every operation receives the acting `AccountId`
//!   as a parameter; nothing in the workspace reads an ambient session.

pub mod entities;

pub use entities::*;
