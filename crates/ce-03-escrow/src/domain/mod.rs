//! # Domain Layer
//!
//! Pure escrow rules: the transition authority, admission guard and rating checks.

pub mod guard;
pub mod rating;
pub mod state_machine;

pub use guard::{admit, Admission};
pub use rating::{validate_rating, MAX_STARS, MIN_STARS};
pub use state_machine::{authorize, Actor, LedgerEffect, Transition};
