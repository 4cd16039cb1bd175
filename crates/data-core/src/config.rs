//! User configuration: the user's name and the configured dataset indexes.
//!
//! The config file is TOML, at `$DATA_CONFIG` or `~/.dataconfig`:
//!
//! ```toml
//! [user]
//! name = "jbenet"
//!
//! [index.datadex]
//! url = "datadex.io:8080"
//! user = "jbenet"
//! token = "secret"
//! blobstore = "https://s3.amazonaws.com/datadex.archives"
//! ```
//!
//! `DATA_INDEX_URL`, `DATA_USER`, `DATA_TOKEN` and `DATA_BLOBSTORE_URL`
//! override the main index entry.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// Name of the index used when none is selected.
pub const MAIN_INDEX: &str = "datadex";

/// Suffix of the index API below the index base URL.
pub const API_URL_SUFFIX: &str = "/api/v1";

const DEFAULT_INDEX_URL: &str = "datadex.io";
const DEFAULT_BLOBSTORE_URL: &str = "https://s3.amazonaws.com/datadex.archives";
const DEFAULT_TRANSFER_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub user: UserConfig,

    /// Index entries keyed by index name.
    #[serde(default)]
    pub index: BTreeMap<String, IndexConfig>,

    /// Upper bound on concurrent blob transfers.
    #[serde(default = "default_transfer_concurrency")]
    pub transfer_concurrency: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub name: String,
}

/// One index entry. Values are passed through to the transports as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub token: String,
    /// Blob store base URL; keys are appended to it.
    #[serde(default)]
    pub blobstore: String,
}

fn default_transfer_concurrency() -> usize {
    DEFAULT_TRANSFER_CONCURRENCY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: UserConfig::default(),
            index: BTreeMap::new(),
            transfer_concurrency: DEFAULT_TRANSFER_CONCURRENCY,
        }
    }
}

/// Fully resolved settings for talking to one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    pub name: String,
    /// Base URL for dataset web pages.
    pub base_url: String,
    /// Base URL for API calls (ends in `/api/v1`).
    pub api_url: String,
    pub blobstore_url: String,
    pub user: String,
    pub token: String,
}

impl Config {
    /// Load the user config, falling back to defaults if no file exists.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load() -> Result<Self> {
        let mut config = match crate::paths::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse the config file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DataError::io_at(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DataError::Config(e.to_string()))
    }

    fn apply_env(&mut self) {
        let entry = self.index.entry(MAIN_INDEX.to_string()).or_default();
        let vars = [
            ("DATA_INDEX_URL", &mut entry.url),
            ("DATA_USER", &mut entry.user),
            ("DATA_TOKEN", &mut entry.token),
            ("DATA_BLOBSTORE_URL", &mut entry.blobstore),
        ];
        for (var, slot) in vars {
            if let Ok(val) = std::env::var(var) {
                *slot = val;
            }
        }
    }

    /// The acting user: `[user] name`, else the main index user.
    pub fn user_name(&self) -> String {
        if !self.user.name.is_empty() {
            return self.user.name.clone();
        }
        self.index
            .get(MAIN_INDEX)
            .map(|i| i.user.clone())
            .unwrap_or_default()
    }

    /// Resolve the settings of the index called `name`.
    pub fn index_settings(&self, name: &str) -> IndexSettings {
        let entry = self.index.get(name).cloned().unwrap_or_default();
        let url = if entry.url.is_empty() {
            DEFAULT_INDEX_URL
        } else {
            &entry.url
        };
        let (base_url, api_url) = normalize_index_url(url);
        let blobstore_url = if entry.blobstore.is_empty() {
            DEFAULT_BLOBSTORE_URL.to_string()
        } else {
            with_scheme(&entry.blobstore).trim_end_matches('/').to_string()
        };

        IndexSettings {
            name: name.to_string(),
            base_url,
            api_url,
            blobstore_url,
            user: entry.user,
            token: entry.token,
        }
    }

    pub fn main_index(&self) -> IndexSettings {
        self.index_settings(MAIN_INDEX)
    }
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Split a configured index URL into `(base_url, api_url)`.
///
/// A missing scheme gets `http://`; the API URL always ends in `/api/v1`.
pub fn normalize_index_url(url: &str) -> (String, String) {
    let url = with_scheme(&url.trim().to_lowercase());
    let url = url.trim_end_matches('/');
    match url.strip_suffix(API_URL_SUFFIX) {
        Some(base) => (base.to_string(), url.to_string()),
        None => (url.to_string(), format!("{url}{API_URL_SUFFIX}")),
    }
}
