//! Error kinds shared by every workflow.

use std::path::PathBuf;

use data_schema::{BlobHash, SchemaError};
use thiserror::Error;

pub type Result<T, E = DataError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error at {}: {source}", path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error status code: {status} ({message})")]
    Transport { status: u16, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error(
        "You ({user}) lack permissions to publish to {dataset}. Either fork your own copy of the dataset, or ask the owner ({owner}) for collaboration privileges."
    )]
    Forbidden {
        user: String,
        dataset: String,
        owner: String,
    },

    #[error("Connection to the index refused. Is the dataset index down? Check {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hash mismatch for {}: expected {expected}, got {actual}", path.display())]
    Integrity {
        path: PathBuf,
        expected: BlobHash,
        actual: BlobHash,
    },

    #[error(
        "Manifest incomplete. Generate it with 'data pack make', or finish it with 'data manifest hash <path>'."
    )]
    ManifestIncomplete,

    #[error("Datafile invalid. Try running 'data pack make'.")]
    DescriptorInvalid,

    #[error("{0} objects must be uploaded first. Run 'data pack upload'.")]
    BlobsNotUploaded(usize),

    #[error("{failed}/{total} checksums failed!")]
    ChecksumFailures { failed: usize, total: usize },

    #[error("No datasets specified and no valid dependencies in the Datafile.")]
    NothingToGet,

    #[error(
        "Version {version} ({existing:.7}) already published, but contents differ. Increment the version in the Datafile ({dataset}), or overwrite with --force."
    )]
    VersionConflict {
        version: String,
        existing: String,
        dataset: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid manifest path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Path {0} is not tracked in the manifest.")]
    PathNotTracked(String),

    #[error("Hash {0} is not tracked in the manifest.")]
    HashNotTracked(String),

    #[error("No versions published for {0}.")]
    NoSuchVersion(String),

    #[error("No ref for version {0}.")]
    NoRefForVersion(String),

    #[error("Failed to parse {what}: {source}")]
    Yaml {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DataError {
    pub(crate) fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn yaml(what: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            what: what.into(),
            source,
        }
    }

    /// True for a 404 from any backend.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
