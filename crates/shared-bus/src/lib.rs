//! # Shared Bus - Escrow Event Notifications
//!
//! Carries committed escrow transitions to whoever needs to tell the other
//! party: push gateways, e-mail workers, audit sinks.
//!
//! ## Delivery Rules
//!
//! - Events are published only after the transition they describe committed.
//! - Delivery is best effort. Publishing never fails and never blocks a
//!   transition; with no subscribers the event is dropped with a warning.
//! - Ledger corruption is routed to the Dead Letter Queue topic.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Escrow (ce-3)│                    │ Notification │
//! │              │    publish()       │    relay     │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
mod registry;
pub mod subscriber;

// Re-export main types
pub use events::{subsystem, EscrowEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Dead Letter Queue topic name for operator tooling.
pub const DLQ_TOPIC: &str = "dlq.critical";
