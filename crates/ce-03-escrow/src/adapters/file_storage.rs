//! In-memory file storage.

use crate::ports::{FileStorage, StorageError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Default upload limit (10 MiB).
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Accepted top-level MIME types.
const ACCEPTED_TYPES: &[&str] = &["image/", "video/", "audio/", "application/pdf", "text/"];

struct StoredFile {
    content_type: String,
    bytes: Vec<u8>,
}

/// Keeps uploads in memory and hands out stable URLs.
pub struct InMemoryFileStorage {
    base_url: String,
    max_bytes: usize,
    files: RwLock<HashMap<String, StoredFile>>,
    next_id: AtomicU64,
    available: AtomicBool,
}

impl InMemoryFileStorage {
    /// Storage rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_limit(base_url, DEFAULT_MAX_ATTACHMENT_BYTES)
    }

    /// Storage with a custom size limit.
    pub fn with_limit(base_url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_bytes,
            files: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backend going away or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Fetch stored bytes and their content type.
    pub fn get(&self, url: &str) -> Option<(String, Vec<u8>)> {
        self.files
            .read()
            .get(url)
            .map(|f| (f.content_type.clone(), f.bytes.clone()))
    }
}

impl Default for InMemoryFileStorage {
    fn default() -> Self {
        Self::new("memory://attachments")
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn store(&self, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("file storage offline".to_string()));
        }
        if !ACCEPTED_TYPES.iter().any(|t| content_type.starts_with(t)) {
            return Err(StorageError::UnsupportedType(content_type.to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let url = format!("{}/{:08}", self.base_url, id);
        self.files.write().insert(
            url.clone(),
            StoredFile {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(url)
    }
}
