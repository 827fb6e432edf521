//! # CE-03 Escrow Engine
//!
//! Holds sender credits while a creator decides, and settles them exactly once.
//!
//! **Subsystem ID:** 3
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## State Machine
//!
//! ```text
//!                 reply(complete) ──→ REPLIED    credit creator
//!                /
//! create ──→ PENDING ── reconciler ──→ EXPIRED   refund sender
//!    │           \
//!    │            cancel ──────────→ CANCELLED   refund sender
//!    │
//!    └── product / tip ────────────→ REPLIED     transfer at creation
//! ```
//!
//! ## Guarantees
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | One authority for transitions | `domain::authorize` |
//! | First committed transition wins | `MessageStore::resolve_pending` compare-and-set |
//! | Status and credits move together | Ledger effect runs inside the store critical section |
//! | Expiry before every read | `ExpirationReconciler` on list/get/reply paths |
//! | No duplicate threads or purchases | `domain::admit` inside `create_guarded` |
//! | Notifications never roll back | Sent after commit; failures logged at warn |
//! | Corruption is loud | `CriticalError` published, accounts halted |
//!
//! ## Module Structure
//!
//! ```text
//! ce-03-escrow/
//! ├── domain/        # authorize, admit, validate_rating
//! ├── ports/         # EscrowApi, ProfileDirectory, NotificationSink, FileStorage, TimeSource
//! ├── adapters/      # InMemoryProfileDirectory, BusNotifier, InMemoryFileStorage
//! ├── reconciler.rs  # ExpirationReconciler
//! ├── settlement.rs  # apply_effect
//! ├── service.rs     # EscrowService
//! ├── config.rs      # EscrowConfig
//! ├── error.rs       # EscrowError, ErrorKind
//! └── metrics.rs     # Prometheus counters (feature "metrics")
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod reconciler;
pub mod service;
pub mod settlement;

// Re-exports
pub use adapters::{BusNotifier, CreatorProfile, InMemoryFileStorage, InMemoryProfileDirectory};
pub use config::EscrowConfig;
pub use domain::{admit, authorize, validate_rating, Actor, Admission, LedgerEffect, Transition};
pub use error::{ErrorKind, EscrowError, EscrowResult};
pub use ports::{
    CreateMessageRequest, EscrowApi, FileStorage, ManualClock, NotificationSink, NotifyError,
    ProfileDirectory, ReplyRequest, StorageError, SystemTimeSource, TimeSource,
};
pub use reconciler::{DeferredExpiry, ExpirationReconciler, ReconcileReport};
pub use service::{EscrowPorts, EscrowService};
pub use settlement::apply_effect;
