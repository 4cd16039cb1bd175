//! The ref index: which manifest hash each published dataset version points to.
//!
//! The index is addressed by dataset path (`author/name`). Its record lists
//! published versions in publish order plus an alias table; `latest` names
//! the most recently published version.

mod http;
mod memory;

pub use http::HttpIndex;
pub use memory::MemoryIndex;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use data_schema::{BlobHash, LATEST};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DataError, Result};

/// One published version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRef {
    pub version: String,
    #[serde(rename = "ref")]
    pub hash: BlobHash,
}

/// Everything the index knows about one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRecord {
    #[serde(default)]
    pub versions: Vec<VersionRef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
}

impl RefRecord {
    /// Resolve an alias (or `latest`) to a concrete version string.
    pub fn resolve(&self, version: &str) -> Option<String> {
        if self.versions.is_empty() {
            return None;
        }
        if let Some(v) = self.aliases.get(version) {
            return Some(v.clone());
        }
        if version == LATEST {
            return self.versions.last().map(|v| v.version.clone());
        }
        Some(version.to_string())
    }

    pub fn hash_of(&self, version: &str) -> Option<&BlobHash> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.version == version)
            .map(|v| &v.hash)
    }

    /// Record `version -> hash`. A new version becomes `latest`; replacing an
    /// existing version keeps its position.
    pub fn publish(&mut self, version: &str, hash: &BlobHash) {
        if let Some(existing) = self.versions.iter_mut().find(|v| v.version == version) {
            existing.hash = hash.clone();
            return;
        }
        self.versions.push(VersionRef {
            version: version.to_string(),
            hash: hash.clone(),
        });
        self.aliases.insert(LATEST.to_string(), version.to_string());
    }
}

/// Transport to a ref index.
#[async_trait]
pub trait IndexBackend: Send + Sync + std::fmt::Debug {
    /// Fetch the record for `path`. An unknown dataset is
    /// `DataError::NotFound`.
    async fn fetch_refs(&self, path: &str) -> Result<RefRecord>;

    /// Publish `hash` as `version` of `path`.
    async fn put_ref(&self, path: &str, version: &str, hash: &BlobHash) -> Result<()>;
}

/// Cached view of one dataset's refs.
#[derive(Debug, Clone)]
pub struct RefIndex {
    backend: Arc<dyn IndexBackend>,
    path: String,
    refs: Option<RefRecord>,
}

impl RefIndex {
    pub fn new(backend: Arc<dyn IndexBackend>, path: impl Into<String>) -> Self {
        Self {
            backend,
            path: path.into(),
            refs: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The dataset's record, fetched once and cached unless `refresh` is set.
    pub async fn fetch_refs(&mut self, refresh: bool) -> Result<&RefRecord> {
        if refresh {
            self.refs = None;
        }
        let refs = match self.refs.take() {
            Some(refs) => refs,
            None => {
                debug!("fetching refs for {}", self.path);
                self.backend.fetch_refs(&self.path).await?
            }
        };
        Ok(self.refs.insert(refs))
    }

    /// Resolve `version` (possibly an alias such as `latest`) to a concrete
    /// version string.
    pub async fn ref_version(&mut self, version: &str) -> Result<String> {
        let path = self.path.clone();
        self.fetch_refs(false)
            .await?
            .resolve(version)
            .ok_or(DataError::NoSuchVersion(path))
    }

    /// The manifest hash published as `version`.
    pub async fn version_ref(&mut self, version: &str) -> Result<BlobHash> {
        self.fetch_refs(false)
            .await?
            .hash_of(version)
            .cloned()
            .ok_or_else(|| DataError::NoRefForVersion(version.to_string()))
    }

    /// Publish `hash` as `version`. The cache is dropped so later lookups
    /// see the new ref.
    pub async fn put(&mut self, version: &str, hash: &BlobHash) -> Result<()> {
        self.backend.put_ref(&self.path, version, hash).await?;
        self.refs = None;
        Ok(())
    }
}
