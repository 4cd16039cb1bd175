//! Shared workflow context.
//!
//! Groups the blob store, ref index, reporter and acting user so the pack
//! and get workflows don't each take half a dozen arguments.

use std::fmt;
use std::sync::Arc;

use crate::config::{Config, IndexSettings};
use crate::error::Result;
use crate::http::HttpClient;
use crate::index::{HttpIndex, IndexBackend, MemoryIndex};
use crate::reporter::{NullReporter, Reporter};
use crate::store::{BlobStore, HttpBlobStore, MemoryBlobStore};

#[derive(Clone)]
pub struct Context {
    pub blobs: Arc<dyn BlobStore>,
    pub index: Arc<dyn IndexBackend>,
    pub reporter: Arc<dyn Reporter>,
    /// The acting user, checked against dataset authors on publish.
    pub user: String,
    pub settings: IndexSettings,
    pub transfer_concurrency: usize,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("user", &self.user)
            .field("index", &self.settings.api_url)
            .field("blobstore", &self.settings.blobstore_url)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        index: Arc<dyn IndexBackend>,
        reporter: Arc<dyn Reporter>,
        settings: IndexSettings,
    ) -> Self {
        Self {
            blobs,
            index,
            reporter,
            user: settings.user.clone(),
            settings,
            transfer_concurrency: 4,
        }
    }

    /// Build a context talking to the main index from `config`.
    pub fn from_config(config: &Config, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let settings = config.main_index();
        let client = HttpClient::new(&settings.user, &settings.token)?;
        let blobs = HttpBlobStore::new(client.clone(), &settings.blobstore_url);
        let index = HttpIndex::new(client, &settings.api_url);

        let mut ctx = Self::new(Arc::new(blobs), Arc::new(index), reporter, settings);
        ctx.user = config.user_name();
        ctx.transfer_concurrency = config.transfer_concurrency.max(1);
        Ok(ctx)
    }

    /// Context backed by in-process stores, returned alongside them.
    pub fn in_memory(user: &str) -> (Self, Arc<MemoryBlobStore>, Arc<MemoryIndex>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let index = Arc::new(MemoryIndex::new());
        let mut settings = Config::default().main_index();
        settings.user = user.to_string();
        let ctx = Self::new(
            blobs.clone(),
            index.clone(),
            Arc::new(NullReporter),
            settings,
        );
        (ctx, blobs, index)
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Web page of `dataset` (`author/name@version`) on the index.
    pub fn dataset_url(&self, dataset: &str) -> String {
        format!("{}/{}", self.settings.base_url, dataset)
    }
}
