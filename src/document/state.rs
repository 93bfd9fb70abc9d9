//! The shared document record.
//!
//! A single [`DocumentState`] lives behind a [`SharedDocument`] handle. The
//! ingestor is the only writer; request handlers take a
//! [`DocumentSnapshot`] under the read lock and drop the lock before doing
//! any I/O.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Content served before the first update arrives.
pub const PLACEHOLDER: &str = "No content.";

/// Latest document content and the directory its assets live in.
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Raw content bytes (always UTF-8)
    pub content: Bytes,
    /// Base directory for asset lookups, empty until the first update
    pub directory: PathBuf,
    /// Time of the most recent update
    pub last_modified: DateTime<Utc>,
    /// Number of updates applied so far
    pub generation: u64,
}

/// Point-in-time copy of [`DocumentState`] taken under the lock.
pub type DocumentSnapshot = DocumentState;

impl DocumentState {
    pub fn new() -> Self {
        Self {
            content: Bytes::from_static(PLACEHOLDER.as_bytes()),
            directory: PathBuf::new(),
            last_modified: Utc::now(),
            generation: 0,
        }
    }

    /// Replace every field at once.
    ///
    /// `last_modified` never moves backwards, even if the wall clock does.
    pub fn apply(&mut self, content: String, directory: String) {
        let now = Utc::now();
        self.last_modified = now.max(self.last_modified);
        self.content = Bytes::from(content);
        self.directory = PathBuf::from(directory);
        self.generation += 1;
    }
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle to the process-wide document.
#[derive(Debug, Clone, Default)]
pub struct SharedDocument {
    inner: Arc<RwLock<DocumentState>>,
}

impl SharedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the document.
    pub async fn update(&self, content: String, directory: String) {
        let mut state = self.inner.write().await;
        state.apply(content, directory);
    }

    /// Same as [`update`](Self::update), for callers outside the runtime.
    ///
    /// Panics if called from within an async context.
    pub fn blocking_update(&self, content: String, directory: String) {
        let mut state = self.inner.blocking_write();
        state.apply(content, directory);
    }

    /// Copy the current state out. The lock is released before returning.
    pub async fn snapshot(&self) -> DocumentSnapshot {
        self.inner.read().await.clone()
    }

    /// Same as [`snapshot`](Self::snapshot), for callers outside the runtime.
    pub fn blocking_snapshot(&self) -> DocumentSnapshot {
        self.inner.blocking_read().clone()
    }
}
