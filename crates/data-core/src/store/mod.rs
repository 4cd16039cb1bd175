//! Blob stores: opaque key/value storage for dataset contents.
//!
//! Keys are strings (in practice `/blob/<hash>`); stores never interpret
//! them. Integrity is checked by the callers in [`crate::io::transfer`].

mod http;
mod memory;

pub use http::HttpBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::Result;

/// Byte stream handed to and returned from a store.
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Whether a value exists under `key`.
    async fn has(&self, key: &str) -> Result<bool>;

    /// Store everything read from `reader` under `key`, replacing any
    /// previous value.
    async fn put(&self, key: &str, reader: BlobReader) -> Result<()>;

    /// Open the value under `key`. A missing key is `DataError::NotFound`.
    async fn get(&self, key: &str) -> Result<BlobReader>;
}
