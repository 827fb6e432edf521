//! # Escrow Telemetry
//!
//! Logging and metrics for the escrow runtime.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` registry with an env filter and a pretty
//!   or JSON formatter
//! - **Metrics**: Prometheus collectors, rendered in text format on demand
//!
//! ## Usage
//!
//! ```rust,ignore
//! use escrow_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ESCROW_SERVICE_NAME` | `credit-escrow` | Service name in logs |
//! | `ESCROW_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `ESCROW_JSON_LOGS` | `false` (`true` in containers) | JSON log output |
//! | `ESCROW_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `ESCROW_ENVIRONMENT` | `dev` | Deployment environment |

#![warn(missing_docs)]

mod config;
pub mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, EXPIRY_SWEEPS, EXPIRY_SWEEP_DURATION,
    NOTIFICATIONS_LAGGED, NOTIFICATIONS_RELAYED,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),

    /// Prometheus registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active. Logs shutdown on drop.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    /// The service name logs are tagged with.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
