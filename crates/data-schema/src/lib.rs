//! Shared types for `data`: blob hashes and keys, dataset handles, and
//! dataset descriptors. No I/O happens here.

pub mod descriptor;
pub mod handle;
pub mod hash;

pub use descriptor::Descriptor;
pub use handle::{Handle, LATEST, ident_string, is_ident, is_version};
pub use hash::{BlobHash, BlobKey, ManifestEntry, UNHASHED_SENTINEL, is_hash};

/// Validation failures for schema values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Not 40 lowercase hex characters.
    #[error("invalid hash: {0:?}")]
    InvalidHash(String),

    /// Not of the form `author/name[@version]`.
    #[error("invalid dataset handle: {0:?} (expected <author>/<name>[@<version>])")]
    InvalidHandle(String),
}
