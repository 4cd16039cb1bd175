//! Streaming SHA-1 hashing of files and byte sources.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use data_schema::BlobHash;
use sha1::{Digest, Sha1};

use crate::error::{DataError, Result};

const BUF_SIZE: usize = 64 * 1024;

/// Hash everything readable from `reader`.
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<BlobHash> {
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(BlobHash::from_digest(&hasher.finalize()))
}

/// Hash the contents of the file at `path`.
pub fn hash_file(path: &Path) -> Result<BlobHash> {
    let file = File::open(path).map_err(|e| DataError::io_at(path, e))?;
    hash_reader(BufReader::with_capacity(BUF_SIZE, file)).map_err(|e| DataError::io_at(path, e))
}

pub fn hash_bytes(bytes: &[u8]) -> BlobHash {
    BlobHash::from_digest(&Sha1::digest(bytes))
}

/// Incremental hasher for content that arrives in chunks.
#[derive(Default, Clone)]
pub struct StreamHasher(Sha1);

impl std::fmt::Debug for StreamHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHasher").finish_non_exhaustive()
    }
}

impl StreamHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.0.update(chunk);
    }

    pub fn finish(self) -> BlobHash {
        BlobHash::from_digest(&self.0.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digests() {
        assert_eq!(
            hash_bytes(b"hello\n").as_str(),
            "f572d396fae9206628714fb2ce00f72e94f2258f"
        );
        assert_eq!(
            hash_bytes(b"").as_str(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn reader_matches_bytes() {
        let data = vec![7u8; BUF_SIZE * 3 + 11];
        assert_eq!(hash_reader(&data[..]).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn stream_matches_bytes() {
        let mut h = StreamHasher::new();
        h.update(b"hel");
        h.update(b"lo\n");
        assert_eq!(h.finish(), hash_bytes(b"hello\n"));
    }

    #[test]
    fn file_hash_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello\n").unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_bytes(b"hello\n"));

        let err = hash_file(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, DataError::IoAt { .. }));
    }
}
