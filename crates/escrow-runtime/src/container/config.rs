//! # Runtime Configuration
//!
//! Unified configuration for the escrow engine and the runtime around it.
//!
//! Every field has a default; `from_env` applies `ESCROW_*` overrides on top.
//! Malformed values are rejected rather than silently ignored.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use ce_03_escrow::EscrowConfig;
use escrow_telemetry::TelemetryConfig;
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use thiserror::Error;

/// Default attachment base URL.
pub const DEFAULT_ATTACHMENT_BASE_URL: &str = "memory://attachments";

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Escrow engine rules.
    pub escrow: EscrowConfig,
    /// Logging and metrics.
    pub telemetry: TelemetryConfig,
    /// Per-subscriber event buffer.
    pub bus_capacity: usize,
    /// Seconds between background expiry sweeps. Zero disables the sweeper.
    pub sweep_interval_secs: u64,
    /// Seconds handlers get to stop after the shutdown signal.
    pub shutdown_grace_secs: u64,
    /// Prefix for attachment URLs.
    pub attachment_base_url: String,
    /// Upload size limit in bytes.
    pub max_attachment_bytes: usize,
    /// Where to serve Prometheus text. `None` disables the endpoint.
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            escrow: EscrowConfig::default(),
            telemetry: TelemetryConfig::default(),
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
            sweep_interval_secs: 0,
            shutdown_grace_secs: 2,
            attachment_base_url: DEFAULT_ATTACHMENT_BASE_URL.to_string(),
            max_attachment_bytes: ce_03_escrow::adapters::DEFAULT_MAX_ATTACHMENT_BYTES,
            metrics_addr: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// The combination of values is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl RuntimeConfig {
    /// Defaults with `ESCROW_*` environment overrides applied.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `ESCROW_DEFAULT_WINDOW_HOURS` | `escrow.default_response_window_hours` |
    /// | `ESCROW_MAX_WINDOW_HOURS` | `escrow.max_response_window_hours` |
    /// | `ESCROW_MAX_CONTENT_CHARS` | `escrow.max_content_chars` |
    /// | `ESCROW_MAX_REVIEW_CHARS` | `escrow.max_review_chars` |
    /// | `ESCROW_WELCOME_MESSAGES` | `escrow.welcome_messages_enabled` |
    /// | `ESCROW_BUS_CAPACITY` | `bus_capacity` |
    /// | `ESCROW_SWEEP_INTERVAL_SECS` | `sweep_interval_secs` |
    /// | `ESCROW_SHUTDOWN_GRACE_SECS` | `shutdown_grace_secs` |
    /// | `ESCROW_ATTACHMENT_BASE_URL` | `attachment_base_url` |
    /// | `ESCROW_MAX_ATTACHMENT_BYTES` | `max_attachment_bytes` |
    /// | `ESCROW_MIN_WITHDRAWAL` | `escrow.min_withdrawal` |
    /// | `ESCROW_METRICS_ADDR` | `metrics_addr` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as `from_env` with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self {
            telemetry: TelemetryConfig::from_env(),
            ..Self::default()
        };

        override_with(&lookup, "ESCROW_DEFAULT_WINDOW_HOURS", &mut config.escrow.default_response_window_hours)?;
        override_with(&lookup, "ESCROW_MAX_WINDOW_HOURS", &mut config.escrow.max_response_window_hours)?;
        override_with(&lookup, "ESCROW_MAX_CONTENT_CHARS", &mut config.escrow.max_content_chars)?;
        override_with(&lookup, "ESCROW_MAX_REVIEW_CHARS", &mut config.escrow.max_review_chars)?;
        override_with(&lookup, "ESCROW_BUS_CAPACITY", &mut config.bus_capacity)?;
        override_with(&lookup, "ESCROW_SWEEP_INTERVAL_SECS", &mut config.sweep_interval_secs)?;
        override_with(&lookup, "ESCROW_SHUTDOWN_GRACE_SECS", &mut config.shutdown_grace_secs)?;
        override_with(&lookup, "ESCROW_MAX_ATTACHMENT_BYTES", &mut config.max_attachment_bytes)?;
        override_with(&lookup, "ESCROW_MIN_WITHDRAWAL", &mut config.escrow.min_withdrawal)?;

        if let Some(value) = lookup("ESCROW_WELCOME_MESSAGES") {
            config.escrow.welcome_messages_enabled =
                parse_flag(&value).ok_or(ConfigError::InvalidValue {
                    var: "ESCROW_WELCOME_MESSAGES",
                    value,
                })?;
        }
        if let Some(url) = lookup("ESCROW_ATTACHMENT_BASE_URL") {
            config.attachment_base_url = url;
        }
        if let Some(value) = lookup("ESCROW_METRICS_ADDR") {
            let addr = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "ESCROW_METRICS_ADDR",
                value,
            })?;
            config.metrics_addr = Some(addr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject unusable combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let escrow = &self.escrow;
        if escrow.max_response_window_hours == 0 {
            return Err(ConfigError::Invalid(
                "max response window must be at least one hour".into(),
            ));
        }
        if escrow.default_response_window_hours == 0
            || escrow.default_response_window_hours > escrow.max_response_window_hours
        {
            return Err(ConfigError::Invalid(format!(
                "default response window {}h must be within 1..={}h",
                escrow.default_response_window_hours, escrow.max_response_window_hours
            )));
        }
        if escrow.max_content_chars == 0 {
            return Err(ConfigError::Invalid("max content chars must be positive".into()));
        }
        if escrow.min_withdrawal == 0 {
            return Err(ConfigError::Invalid("minimum withdrawal must be positive".into()));
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::Invalid("bus capacity must be positive".into()));
        }
        if self.attachment_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("attachment base URL is empty".into()));
        }
        Ok(())
    }
}

fn override_with<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    field: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(var) {
        *field = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value })?;
    }
    Ok(())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
