//! Blob transfers between the local filesystem and a [`crate::store::BlobStore`],
//! plus the atomic file writes the manifest and Datafile rely on.

pub mod transfer;

pub use transfer::{fetch_blob, push_blob, push_file};

use std::io::Write;
use std::path::Path;

use crate::error::{DataError, Result};

/// Replace the file at `path` with `content` so readers never observe a
/// partially written file.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| DataError::io_at(dir, e))?;
    tmp.write_all(content)
        .map_err(|e| DataError::io_at(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| DataError::io_at(path, e.error))?;
    Ok(())
}
