//! The dataset manifest: a map from relative file path to content hash.
//!
//! Stored as YAML at `<root>/Manifest`, one `path: hash` line per file with
//! keys in sorted order. Paths that are tracked but not hashed yet carry the
//! `<to be hashed>` sentinel. Every mutation is persisted immediately, and
//! each write replaces the whole file atomically.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use data_schema::{BlobHash, ManifestEntry, SchemaError};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{DataError, Result};
use crate::hasher::{hash_bytes, hash_file};
use crate::paths::{DATASETS_DIR, LEGACY_MANIFEST, MANIFEST};
use crate::reporter::{NullReporter, Reporter};

/// Result of verifying one tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail,
}

pub struct Manifest {
    root: PathBuf,
    path: PathBuf,
    files: BTreeMap<String, ManifestEntry>,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for Manifest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manifest")
            .field("path", &self.path)
            .field("files", &self.files.len())
            .finish_non_exhaustive()
    }
}

impl Manifest {
    /// Load the manifest of the dataset rooted at `root`.
    ///
    /// A missing file is an empty manifest. Nothing is written until the
    /// first mutation.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(MANIFEST);
        let files = match std::fs::read_to_string(&path) {
            Ok(content) => parse(&content).map_err(|e| DataError::yaml(path.display().to_string(), e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if root.join(LEGACY_MANIFEST).exists() {
                    warn!(
                        "found {} but no {}; rename it to {} to keep using it",
                        LEGACY_MANIFEST, MANIFEST, MANIFEST
                    );
                }
                BTreeMap::new()
            }
            Err(e) => return Err(DataError::io_at(&path, e)),
        };

        Ok(Self {
            root: root.to_path_buf(),
            path,
            files,
            reporter: Arc::new(NullReporter),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Path of the manifest file itself.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.files.iter().map(|(p, e)| (p.as_str(), e))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        normalize_path(path).is_ok_and(|p| self.files.contains_key(&p))
    }

    /// Track `path` without hashing it. Returns `false` if it was already
    /// tracked, in which case nothing changes.
    pub fn add(&mut self, path: &str) -> Result<bool> {
        let path = normalize_path(path)?;
        if self.files.contains_key(&path) {
            return Ok(false);
        }
        self.files.insert(path.clone(), ManifestEntry::Unhashed);
        self.write()?;
        self.reporter.added(&path);
        Ok(true)
    }

    /// Stop tracking `path`. Returns `false` if it was not tracked.
    pub fn remove(&mut self, path: &str) -> Result<bool> {
        let path = normalize_path(path)?;
        if self.files.remove(&path).is_none() {
            return Ok(false);
        }
        self.write()?;
        self.reporter.removed(&path);
        Ok(true)
    }

    /// Hash the file at `path` and record the result, tracking it if needed.
    pub fn hash(&mut self, path: &str) -> Result<BlobHash> {
        let path = normalize_path(path)?;
        let hash = hash_file(&self.root.join(&path))?;
        self.files
            .insert(path.clone(), ManifestEntry::Hashed(hash.clone()));
        self.write()?;
        self.reporter.hashed(&path, &hash);
        Ok(hash)
    }

    /// Verify one tracked file against its recorded hash.
    ///
    /// Unhashed entries and files missing from disk fail.
    pub fn check(&self, path: &str) -> Result<CheckOutcome> {
        let path = normalize_path(path)?;
        let entry = self
            .files
            .get(&path)
            .ok_or_else(|| DataError::PathNotTracked(path.clone()))?;

        let Some(expected) = entry.hash() else {
            self.reporter
                .warning(&format!("check {} {} FAIL (not hashed)", entry, path));
            return Ok(CheckOutcome::Fail);
        };

        let outcome = match hash_file(&self.root.join(&path)) {
            Ok(actual) if actual == *expected => CheckOutcome::Pass,
            Ok(_) => CheckOutcome::Fail,
            Err(e) => {
                debug!("check {}: {}", path, e);
                CheckOutcome::Fail
            }
        };

        match outcome {
            CheckOutcome::Pass => self
                .reporter
                .success(&format!("check {} {} PASS", expected.short(), path)),
            CheckOutcome::Fail => self
                .reporter
                .warning(&format!("check {} {} FAIL", expected.short(), path)),
        }
        Ok(outcome)
    }

    /// Track every regular file below the root, then hash every entry that
    /// still needs it.
    ///
    /// All additions are written before any hashing starts, so an
    /// interrupted run leaves a manifest listing every file.
    pub fn generate(&mut self) -> Result<()> {
        let mut added = Vec::new();
        for path in list_files(&self.root)? {
            if !self.files.contains_key(&path) {
                self.files.insert(path.clone(), ManifestEntry::Unhashed);
                added.push(path);
            }
        }
        self.write()?;
        for path in &added {
            self.reporter.added(path);
        }

        let pending: Vec<String> = self
            .files
            .iter()
            .filter(|(_, e)| !e.is_hashed())
            .map(|(p, _)| p.clone())
            .collect();
        for path in pending {
            self.hash(&path)?;
        }
        Ok(())
    }

    /// Drop every entry.
    pub fn clear(&mut self) -> Result<()> {
        self.files.clear();
        self.write()
    }

    /// True when no entry holds the unhashed sentinel.
    pub fn is_complete(&self) -> bool {
        self.files.values().all(ManifestEntry::is_hashed)
    }

    /// Canonical serialization of the manifest, exactly as stored on disk.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        serde_yaml::to_string(&self.files)
            .map(String::into_bytes)
            .map_err(|e| DataError::yaml(MANIFEST, e))
    }

    /// Hash of the canonical serialization of the hashed entries.
    ///
    /// For a complete manifest this is the hash of [`Self::canonical_bytes`]
    /// and is what the index records as the dataset's ref.
    pub fn manifest_hash(&self) -> Result<BlobHash> {
        Ok(hash_bytes(&self.hashed_bytes()?))
    }

    fn hashed_bytes(&self) -> Result<Vec<u8>> {
        let hashed: BTreeMap<&str, &ManifestEntry> = self
            .files
            .iter()
            .filter(|(_, e)| e.is_hashed())
            .map(|(p, e)| (p.as_str(), e))
            .collect();
        serde_yaml::to_string(&hashed)
            .map(String::into_bytes)
            .map_err(|e| DataError::yaml(MANIFEST, e))
    }

    /// Every tracked path whose content hashes to `hash`.
    pub fn paths_for_hash(&self, hash: &BlobHash) -> Vec<&str> {
        self.files
            .iter()
            .filter(|(_, e)| e.hash() == Some(hash))
            .map(|(p, _)| p.as_str())
            .collect()
    }

    /// The recorded hash of `path`.
    pub fn hash_for_path(&self, path: &str) -> Result<&BlobHash> {
        let path = normalize_path(path)?;
        match self.files.get(&path) {
            None => Err(DataError::PathNotTracked(path)),
            Some(entry) => entry
                .hash()
                .ok_or_else(|| SchemaError::InvalidHash(entry.as_str().to_string()).into()),
        }
    }

    /// Resolve an argument that is either a hash or a tracked path into a
    /// `(hash, path)` pair.
    pub fn pair(&self, path_or_hash: &str) -> Result<(BlobHash, String)> {
        if let Ok(hash) = BlobHash::new(path_or_hash) {
            let path = self
                .paths_for_hash(&hash)
                .first()
                .map(|p| (*p).to_string())
                .ok_or_else(|| DataError::HashNotTracked(hash.to_string()))?;
            return Ok((hash, path));
        }
        let hash = self.hash_for_path(path_or_hash)?.clone();
        Ok((hash, normalize_path(path_or_hash)?))
    }

    fn write(&self) -> Result<()> {
        crate::io::write_atomic(&self.path, &self.canonical_bytes()?)
    }
}

fn parse(content: &str) -> std::result::Result<BTreeMap<String, ManifestEntry>, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let files: Option<BTreeMap<String, ManifestEntry>> = serde_yaml::from_str(content)?;
    Ok(files.unwrap_or_default())
}

/// Normalize a user-supplied path to the manifest's key form, rejecting
/// anything that could not have come from [`list_files`].
pub fn normalize_path(raw: &str) -> Result<String> {
    let invalid = |reason| DataError::InvalidPath {
        path: raw.to_string(),
        reason,
    };

    let mut trimmed = raw;
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    if trimmed.is_empty() {
        return Err(invalid("empty path"));
    }

    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| invalid("not valid UTF-8"))?;
                if part.starts_with('.') {
                    return Err(invalid("hidden files are not tracked"));
                }
                parts.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("path leaves the dataset")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path must be relative"));
            }
        }
    }

    match parts.as_slice() {
        [] => return Err(invalid("empty path")),
        [first, _, ..] if *first == DATASETS_DIR => {
            return Err(invalid("installed datasets are not tracked"));
        }
        _ => {}
    }

    let path = parts.join("/");
    if path == MANIFEST {
        return Err(invalid("the manifest does not track itself"));
    }
    Ok(path)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

/// Every regular file below `root` that belongs in the manifest, as sorted
/// `/`-separated relative paths.
///
/// Hidden files and directories, the `datasets/` install directory and the
/// manifest itself are skipped.
pub fn list_files(root: &Path) -> Result<Vec<String>> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            if is_hidden(e) {
                return false;
            }
            !(e.depth() == 1 && e.file_type().is_dir() && e.file_name() == DATASETS_DIR)
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            DataError::io_at(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(parts) = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()
        else {
            warn!("skipping non UTF-8 path {}", rel.display());
            continue;
        };
        let path = parts.join("/");
        if path == MANIFEST {
            continue;
        }
        match normalize_path(&path) {
            Ok(key) if key == path => files.push(path),
            _ => debug!("skipping untrackable path {path:?}"),
        }
    }
    files.sort();
    Ok(files)
}
