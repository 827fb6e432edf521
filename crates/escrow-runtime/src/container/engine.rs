//! # Engine Wiring
//!
//! Builds the escrow engine from its adapters in dependency order:
//!
//! ```text
//! Level 0: Event bus, clock
//! Level 1: Ledger (ce-01), Message Store (ce-02)
//! Level 2: Profiles, file storage, payout rail, bus notifier
//! Level 3: Escrow engine (ce-03)
//! ```

use std::sync::Arc;

use tracing::info;

use ce_01_ledger::{InMemoryLedger, InMemoryPayoutRail};
use ce_02_message_store::InMemoryMessageStore;
use ce_03_escrow::{
    BusNotifier, EscrowPorts, EscrowService, InMemoryFileStorage, InMemoryProfileDirectory,
    SystemTimeSource, TimeSource,
};
use shared_bus::InMemoryEventBus;

use crate::container::config::RuntimeConfig;

/// Concrete engine type with in-memory backends.
pub type EscrowEngine = EscrowService<InMemoryLedger, InMemoryMessageStore>;

/// Central container holding the engine and its adapters.
pub struct EngineContainer {
    /// Configuration the container was built from.
    pub config: RuntimeConfig,
    /// Notification bus.
    pub bus: Arc<InMemoryEventBus>,
    /// Credits ledger (ce-01).
    pub ledger: Arc<InMemoryLedger>,
    /// Message store (ce-02).
    pub store: Arc<InMemoryMessageStore>,
    /// Creator profiles.
    pub profiles: Arc<InMemoryProfileDirectory>,
    /// Attachment storage.
    pub files: Arc<InMemoryFileStorage>,
    /// Creator payouts.
    pub payout_rail: Arc<InMemoryPayoutRail>,
    /// Escrow engine (ce-03).
    pub engine: Arc<EscrowEngine>,
}

impl EngineContainer {
    /// Wire everything with the system clock.
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Wire everything with a custom clock.
    pub fn with_clock(config: RuntimeConfig, clock: Arc<dyn TimeSource>) -> Self {
        info!("[runtime] Initializing escrow subsystems");

        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));

        let ledger = Arc::new(InMemoryLedger::new());
        let store = Arc::new(InMemoryMessageStore::new());
        info!("[ce-01] Ledger initialized");
        info!("[ce-02] Message store initialized");

        let profiles = Arc::new(InMemoryProfileDirectory::new());
        let files = Arc::new(InMemoryFileStorage::with_limit(
            config.attachment_base_url.clone(),
            config.max_attachment_bytes,
        ));
        let payout_rail = Arc::new(InMemoryPayoutRail::new());
        let notifier = Arc::new(BusNotifier::new(bus.clone()));

        let engine = Arc::new(EscrowService::new(
            config.escrow.clone(),
            Arc::clone(&ledger),
            Arc::clone(&store),
            EscrowPorts {
                profiles: profiles.clone(),
                notifier,
                files: files.clone(),
                clock,
                payout_rail: payout_rail.clone(),
            },
        ));
        info!(
            default_window_hours = config.escrow.default_response_window_hours,
            max_window_hours = config.escrow.max_response_window_hours,
            "[ce-03] Escrow engine initialized"
        );

        Self {
            config,
            bus,
            ledger,
            store,
            profiles,
            files,
            payout_rail,
            engine,
        }
    }
}
