//! # Adapters
//!
//! In-memory and bus-backed implementations of the outbound ports.

pub mod bus_notifier;
pub mod file_storage;
pub mod profiles;

pub use bus_notifier::BusNotifier;
pub use file_storage::{InMemoryFileStorage, DEFAULT_MAX_ATTACHMENT_BYTES};
pub use profiles::{CreatorProfile, InMemoryProfileDirectory};
