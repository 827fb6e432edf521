//! Cross-subsystem tests.

pub mod concurrency;
pub mod properties;
pub mod scenarios;
