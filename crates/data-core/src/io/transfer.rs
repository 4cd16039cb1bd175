//! Streaming blob upload and verified download.
//!
//! Downloads are hashed while they are written and only land at their
//! destination once the content matches the requested key.

use std::path::Path;

use data_schema::BlobHash;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::error::{DataError, Result};
use crate::hasher::StreamHasher;
use crate::store::{BlobReader, BlobStore};

const CHUNK_SIZE: usize = 64 * 1024;

/// Upload everything read from `reader` under the key of `hash`.
pub async fn push_blob(store: &dyn BlobStore, hash: &BlobHash, reader: BlobReader) -> Result<()> {
    store.put(hash.key().as_str(), reader).await
}

/// Upload the file at `path` under the key of `hash`.
pub async fn push_file(store: &dyn BlobStore, hash: &BlobHash, path: &Path) -> Result<()> {
    let file = File::open(path)
        .await
        .map_err(|e| DataError::io_at(path, e))?;
    push_blob(store, hash, Box::new(BufReader::new(file))).await
}

/// Download the blob for `hash` into `dest`, verifying its content.
///
/// Content is streamed into a temporary sibling of `dest` and renamed into
/// place only if it hashes to `hash`; otherwise the temporary file is removed
/// and [`DataError::Integrity`] is returned. Parent directories are created as
/// needed.
pub async fn fetch_blob(store: &dyn BlobStore, hash: &BlobHash, dest: &Path) -> Result<()> {
    let mut reader = store.get(hash.key().as_str()).await?;

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| DataError::io_at(parent, e))?;

    let (file, tmp_path) = tempfile::Builder::new()
        .prefix(".data-")
        .tempfile_in(parent)
        .map_err(|e| DataError::io_at(parent, e))?
        .into_parts();

    // `tmp_path` removes the file when dropped on any early return.
    let actual = write_hashed(&mut reader, File::from_std(file), &tmp_path).await?;
    if actual != *hash {
        return Err(DataError::Integrity {
            path: dest.to_path_buf(),
            expected: hash.clone(),
            actual,
        });
    }

    tmp_path
        .persist(dest)
        .map_err(|e| DataError::io_at(dest, e.error))?;
    debug!("fetched {} -> {}", hash.short(), dest.display());
    Ok(())
}

async fn write_hashed(reader: &mut BlobReader, mut file: File, path: &Path) -> Result<BlobHash> {
    let mut hasher = StreamHasher::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .await
            .map_err(|e| DataError::io_at(path, e))?;
        hasher.update(&buf[..n]);
    }

    file.flush().await.map_err(|e| DataError::io_at(path, e))?;
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::hash_bytes;
    use crate::store::MemoryBlobStore;

    #[tokio::test]
    async fn push_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        std::fs::write(&src, "hello\n").unwrap();
        let hash = hash_bytes(b"hello\n");

        let store = MemoryBlobStore::new();
        push_file(&store, &hash, &src).await.unwrap();
        assert!(store.contains(hash.key().as_str()));

        let dest = dir.path().join("out/nested/dst.txt");
        fetch_blob(&store, &hash, &dest).await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello\n");
    }

    #[tokio::test]
    async fn corrupt_blob_never_lands() {
        let dir = tempfile::tempdir().unwrap();
        let hash = hash_bytes(b"hello\n");
        let store = MemoryBlobStore::new();
        store.insert_raw(hash.key().as_str(), &b"tampered\n"[..]);

        let dest = dir.path().join("dst.txt");
        std::fs::write(&dest, "previous\n").unwrap();
        let err = fetch_blob(&store, &hash, &dest).await.unwrap_err();
        match err {
            DataError::Integrity {
                expected, actual, ..
            } => {
                assert_eq!(expected, hash);
                assert_eq!(actual, hash_bytes(b"tampered\n"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous\n");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn missing_blob_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("dst.txt");
        let err = fetch_blob(&MemoryBlobStore::new(), &hash_bytes(b"x"), &dest)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!dest.exists());
    }
}
