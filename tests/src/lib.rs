//! # Credit Escrow Test Suite
//!
//! Cross-crate tests that drive the full engine the way the runtime wires it.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs          # EscrowWorld: container + manual clock + funded accounts
//! │   └── integration/
//! │       ├── scenarios.rs     # End-to-end walkthroughs
//! │       ├── properties.rs    # Conservation and write-once rules, randomized
//! │       └── concurrency.rs   # Races between terminal transitions
//! └── benches/
//!     └── escrow_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p escrow-tests
//! cargo test -p escrow-tests integration::concurrency
//! cargo bench -p escrow-tests
//! ```

pub mod fixtures;
pub mod integration;
