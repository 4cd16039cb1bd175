use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncReadExt;

use super::{BlobReader, BlobStore};
use crate::error::{DataError, Result};

/// In-process blob store, used for tests and offline work.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Bytes>>,
    puts: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `key` without going through `put`. Lets tests
    /// plant content that does not match its key.
    pub fn insert_raw(&self, key: &str, bytes: impl Into<Bytes>) {
        self.lock().insert(key.to_string(), bytes.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `put` calls served so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Bytes>> {
        self.blobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.contains(key))
    }

    async fn put(&self, key: &str, mut reader: BlobReader) -> Result<()> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.lock().insert(key.to_string(), Bytes::from(buf));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobReader> {
        let bytes = self
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| DataError::NotFound(key.to_string()))?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_has() {
        let store = MemoryBlobStore::new();
        assert!(!store.has("/blob/a").await.unwrap());
        let missing = store.get("/blob/a").await.err().expect("missing blob should fail");
        assert!(missing.is_not_found());

        store
            .put("/blob/a", Box::new(Cursor::new(b"abc".to_vec())))
            .await
            .unwrap();
        assert!(store.has("/blob/a").await.unwrap());
        assert_eq!(store.put_count(), 1);

        let mut out = Vec::new();
        store
            .get("/blob/a")
            .await
            .unwrap()
            .read_to_end(&mut out)
            .await
            .unwrap();
        assert_eq!(out, b"abc");
    }
}
