use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use data_schema::BlobHash;

use super::{IndexBackend, RefRecord};
use crate::error::{DataError, Result};

/// In-process ref index.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    records: Mutex<HashMap<String, RefRecord>>,
    posts: AtomicUsize,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish directly, without counting as a post.
    pub fn seed(&self, path: &str, version: &str, hash: &BlobHash) {
        self.lock()
            .entry(path.to_string())
            .or_default()
            .publish(version, hash);
    }

    pub fn record(&self, path: &str) -> Option<RefRecord> {
        self.lock().get(path).cloned()
    }

    /// Number of `put_ref` calls served so far.
    pub fn post_count(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, RefRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl IndexBackend for MemoryIndex {
    async fn fetch_refs(&self, path: &str) -> Result<RefRecord> {
        self.record(path)
            .ok_or_else(|| DataError::NotFound(path.to_string()))
    }

    async fn put_ref(&self, path: &str, version: &str, hash: &BlobHash) -> Result<()> {
        self.posts.fetch_add(1, Ordering::SeqCst);
        self.seed(path, version, hash);
        Ok(())
    }
}
