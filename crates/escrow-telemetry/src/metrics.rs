//! Prometheus metrics for the escrow runtime.
//!
//! All runtime metrics follow the naming convention `escrow_runtime_<metric>_<unit>`.
//! Subsystem crates register their own collectors in the default Prometheus
//! registry; `encode_metrics` renders both.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Runtime metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Notifications handed to the delivery transport
    pub static ref NOTIFICATIONS_RELAYED: IntCounterVec = IntCounterVec::new(
        Opts::new("escrow_runtime_notifications_relayed_total", "Notifications relayed to recipients"),
        &["topic"]
    ).expect("metric creation failed");

    /// Notifications lost because the relay fell behind the bus
    pub static ref NOTIFICATIONS_LAGGED: IntCounter = IntCounter::new(
        "escrow_runtime_notifications_lagged_total",
        "Notifications dropped because the relay lagged"
    ).expect("metric creation failed");

    /// Expiration sweeps run by the optional background sweeper
    pub static ref EXPIRY_SWEEPS: IntCounterVec = IntCounterVec::new(
        Opts::new("escrow_runtime_expiry_sweeps_total", "Background expiry sweeps"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Sweep duration
    pub static ref EXPIRY_SWEEP_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "escrow_runtime_expiry_sweep_duration_seconds",
            "Time spent in one background expiry sweep"
        ).buckets(exponential_buckets(0.0001, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");
}

/// Register runtime metrics with the runtime registry.
///
/// Registering twice returns an error, which callers may ignore.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(NOTIFICATIONS_RELAYED.clone()),
        Box::new(NOTIFICATIONS_LAGGED.clone()),
        Box::new(EXPIRY_SWEEPS.clone()),
        Box::new(EXPIRY_SWEEP_DURATION.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }
    Ok(())
}

/// Encode runtime and subsystem metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let mut families = REGISTRY.gather();
    families.extend(prometheus::gather());

    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
