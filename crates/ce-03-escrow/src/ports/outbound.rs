//! # Outbound Ports
//!
//! Collaborators the engine drives. All are outside the transaction boundary.

use async_trait::async_trait;
use shared_bus::EscrowEvent;
use shared_types::{AccountId, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Creator profile lookups.
pub trait ProfileDirectory: Send + Sync {
    /// Configured response window in hours, if the creator set one.
    fn response_window_hours(&self, creator: AccountId) -> Option<u32>;

    /// Welcome text appended to new regular messages.
    fn welcome_message(&self, creator: AccountId) -> Option<String>;

    /// Display name for notifications.
    fn display_name(&self, account: AccountId) -> Option<String>;
}

/// Notification delivery failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Best-effort notification transport.
///
/// Called after a transition commits. Errors are logged and never roll back.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver an event to the parties it concerns.
    async fn notify(&self, event: EscrowEvent) -> Result<(), NotifyError>;
}

/// File storage failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Content type not accepted.
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    /// Upload exceeded the size limit.
    #[error("File of {size} bytes exceeds limit of {limit}")]
    TooLarge {
        /// Upload size
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// Backend unreachable.
    #[error("File storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable file storage. The engine keeps URLs, never bytes.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store bytes and return a durable URL.
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Manually driven clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Start at `now` milliseconds.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Move forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
