//! # Expiry Sweeper
//!
//! Optional periodic reconciliation. Every read already reconciles the
//! messages it touches; the sweeper refunds overdue messages nobody reads.

use std::sync::Arc;
use std::time::Duration;

use ce_03_escrow::{EscrowApi, EscrowResult, ReconcileReport};
use escrow_telemetry::{time_histogram, EXPIRY_SWEEPS, EXPIRY_SWEEP_DURATION};
use tracing::{debug, info, instrument, warn};

/// Runs `reconcile_expired` on a fixed interval.
pub struct ExpirySweeper<E: EscrowApi> {
    engine: Arc<E>,
    interval: Duration,
}

impl<E: EscrowApi> ExpirySweeper<E> {
    /// Sweep `engine` every `interval`.
    pub fn new(engine: Arc<E>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// One sweep.
    pub async fn sweep_once(&self) -> EscrowResult<ReconcileReport> {
        let _timer = time_histogram!(EXPIRY_SWEEP_DURATION);

        match self.engine.reconcile_expired().await {
            Ok(report) => {
                let outcome = if !report.deferred.is_empty() {
                    "deferred"
                } else if report.expired.is_empty() {
                    "idle"
                } else {
                    "expired"
                };
                EXPIRY_SWEEPS.with_label_values(&[outcome]).inc();

                if report.expired.is_empty() && report.deferred.is_empty() {
                    debug!("[runtime] Expiry sweep found nothing overdue");
                } else {
                    info!(
                        expired = report.expired.len(),
                        refunded = report.refunded(),
                        deferred = report.deferred.len(),
                        "[runtime] Expiry sweep complete"
                    );
                }
                Ok(report)
            }
            Err(e) => {
                EXPIRY_SWEEPS.with_label_values(&["error"]).inc();
                warn!(error = %e, retryable = e.is_retryable(), "[runtime] Expiry sweep failed");
                Err(e)
            }
        }
    }

    /// Sweep forever. The runtime stops it with the shutdown signal.
    #[instrument(skip(self), name = "expiry_sweeper")]
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "[runtime] Expiry sweeper started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            // Failures are retried on the next tick.
            let _ = self.sweep_once().await;
        }
    }
}
