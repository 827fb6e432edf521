//! # Credit Escrow Runtime
//!
//! Hosts the escrow engine: wires the subsystems, relays notifications and
//! optionally sweeps expired messages in the background.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and subsystem wiring
//! - `handlers/` - Notification relay, expiry sweeper and metrics endpoint
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults + `ESCROW_*` environment)
//! 2. Initialize telemetry
//! 3. Initialize subsystems in dependency order (ledger, store, escrow)
//! 4. Start background handlers
//! 5. Run until Ctrl+C, then shut down gracefully
//!
//! ```text
//!                      ┌────────────────────────┐
//!   callers ──────────→│ EscrowService (ce-03)  │
//!                      │  ├─ Ledger (ce-01)     │
//!                      │  └─ Store  (ce-02)     │
//!                      └──────────┬─────────────┘
//!                                 │ publish
//!                                 ▼
//!                            Event Bus ──→ NotificationRelay
//!                                 ▲
//!        ExpirySweeper ───────────┘ (reconcile_expired every N seconds)
//!
//!        MetricsEndpoint ──→ GET /metrics (when `metrics_addr` is set)
//! ```

pub mod container;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::handlers::{ExpirySweeper, MetricsEndpoint, NotificationRelay};

pub use container::{ConfigError, EngineContainer, EscrowEngine, RuntimeConfig};

/// The runtime orchestrating the engine and its background tasks.
pub struct EscrowRuntime {
    /// Engine and adapters.
    container: Arc<EngineContainer>,
    /// Spawned handler tasks.
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
}

impl EscrowRuntime {
    /// Build the runtime and every subsystem.
    pub fn new(config: RuntimeConfig) -> Self {
        Self::from_container(EngineContainer::new(config))
    }

    /// Build the runtime around an already wired container.
    pub fn from_container(container: EngineContainer) -> Self {
        info!("[runtime] Creating escrow runtime");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            container: Arc::new(container),
            tasks: parking_lot::Mutex::new(Vec::new()),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Start the background handlers.
    pub async fn start(&self) -> anyhow::Result<()> {
        info!("===========================================");
        info!("  Credit Escrow Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        self.start_relay();
        self.start_sweeper();
        self.start_metrics().await?;

        let config = &self.container.config;
        info!(
            bus_capacity = config.bus_capacity,
            sweep_interval_secs = config.sweep_interval_secs,
            welcome_messages = config.escrow.welcome_messages_enabled,
            "[runtime] Escrow runtime ready"
        );
        Ok(())
    }

    fn start_relay(&self) {
        let relay = NotificationRelay::new(&self.container.bus);
        let mut shutdown = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = relay.run() => {}
                _ = shutdown.changed() => {
                    info!("[runtime] Relay received shutdown signal");
                }
            }
        });
        self.tasks.lock().push(handle);
    }

    fn start_sweeper(&self) {
        let interval = self.container.config.sweep_interval_secs;
        if interval == 0 {
            info!("[runtime] Background expiry sweeper disabled; reads reconcile lazily");
            return;
        }

        let sweeper = ExpirySweeper::new(self.engine(), Duration::from_secs(interval));
        let mut shutdown = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = sweeper.run() => {}
                _ = shutdown.changed() => {
                    info!("[runtime] Sweeper received shutdown signal");
                }
            }
        });
        self.tasks.lock().push(handle);
    }

    async fn start_metrics(&self) -> anyhow::Result<()> {
        let Some(addr) = self.container.config.metrics_addr else {
            return Ok(());
        };

        let endpoint = MetricsEndpoint::bind(addr)
            .await
            .with_context(|| format!("binding metrics endpoint on {addr}"))?;
        let mut shutdown = self.shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = endpoint.run() => {}
                _ = shutdown.changed() => {
                    info!("[runtime] Metrics endpoint received shutdown signal");
                }
            }
        });
        self.tasks.lock().push(handle);
        Ok(())
    }

    /// Shut down gracefully.
    ///
    /// Signals every handler, then waits up to the configured grace period
    /// for them to stop.
    pub async fn shutdown(&self) {
        info!("[runtime] Initiating graceful shutdown...");

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("[runtime] Failed to send shutdown signal: {}", e);
        }

        let grace = Duration::from_secs(self.container.config.shutdown_grace_secs);
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if tokio::time::timeout(grace, task).await.is_err() {
                error!("[runtime] Handler did not stop within the grace period");
            }
        }

        info!("[runtime] Shutdown complete");
    }

    /// The escrow engine.
    pub fn engine(&self) -> Arc<EscrowEngine> {
        Arc::clone(&self.container.engine)
    }

    /// The subsystem container.
    pub fn container(&self) -> Arc<EngineContainer> {
        Arc::clone(&self.container)
    }

    /// Number of running background handlers.
    pub fn running_handlers(&self) -> usize {
        self.tasks.lock().iter().filter(|t| !t.is_finished()).count()
    }
}
