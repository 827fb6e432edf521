//! # Background Handlers
//!
//! Long-running tasks spawned by the runtime. Each exposes `run`, which the
//! runtime races against the shutdown signal.

pub mod metrics;
pub mod relay;
pub mod sweeper;

pub use metrics::MetricsEndpoint;
pub use relay::{NotificationRelay, RelayStats};
pub use sweeper::ExpirySweeper;
