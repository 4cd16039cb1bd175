//! Pack workflows: a dataset directory (Datafile + Manifest + files) and the
//! operations that move it to and from the blob store and the ref index.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use data_schema::{BlobHash, Descriptor};
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info};

use crate::context::Context;
use crate::descriptor::{self, Defaults, Prompt};
use crate::error::{DataError, Result};
use crate::hasher::hash_file;
use crate::index::RefIndex;
use crate::io::{fetch_blob, push_blob, push_file};
use crate::manifest::{CheckOutcome, Manifest, normalize_path};
use crate::paths::{DATAFILE, MANIFEST};
use crate::reporter::Direction;

/// Flags given to `pack make`.
#[derive(Debug, Clone, Default)]
pub struct MakeOptions {
    /// Drop the existing manifest and rebuild it from scratch.
    pub clean: bool,
    /// Ask about optional Datafile fields too.
    pub interactive: bool,
    pub dataset: Option<String>,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
}

/// Counts from an upload or download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSummary {
    pub transferred: usize,
    pub skipped: usize,
}

impl TransferSummary {
    fn tally(outcomes: &[bool]) -> Self {
        let transferred = outcomes.iter().filter(|t| **t).count();
        Self {
            transferred,
            skipped: outcomes.len() - transferred,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The index now points `version` at `hash`. `replaced` is the ref that
    /// was overwritten with `--force`.
    Published {
        version: String,
        hash: BlobHash,
        replaced: Option<BlobHash>,
    },
    /// The index already held this exact ref; nothing was posted.
    Unchanged { version: String, hash: BlobHash },
}

#[derive(Debug)]
pub struct Pack {
    root: PathBuf,
    pub descriptor: Descriptor,
    pub manifest: Manifest,
    ctx: Context,
}

impl Pack {
    /// Open the dataset at `root`. A missing or unreadable Datafile reads as
    /// empty; a corrupt Manifest is an error.
    pub fn open(ctx: &Context, root: &Path) -> Result<Self> {
        let descriptor = descriptor::load_or_default(&root.join(DATAFILE));
        let manifest = Manifest::load(root)?.with_reporter(ctx.reporter.clone());
        Ok(Self {
            root: root.to_path_buf(),
            descriptor,
            manifest,
            ctx: ctx.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn datafile_path(&self) -> PathBuf {
        self.root.join(DATAFILE)
    }

    /// Create or update the Datafile, then generate the manifest.
    pub fn make(&mut self, opts: &MakeOptions, prompt: &dyn Prompt) -> Result<()> {
        if let Some(dataset) = &opts.dataset {
            self.descriptor.dataset.clone_from(dataset);
        }
        for (slot, value) in [
            (&mut self.descriptor.tagline, &opts.tagline),
            (&mut self.descriptor.description, &opts.description),
            (&mut self.descriptor.license, &opts.license),
        ] {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }

        let defaults = Defaults {
            user: self.ctx.user.clone(),
            dir_name: self
                .root
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_default(),
            index_base_url: self.ctx.settings.base_url.clone(),
        };
        descriptor::fill_out(&mut self.descriptor, &defaults, prompt, opts.interactive)?;
        if !self.descriptor.is_valid() {
            return Err(DataError::DescriptorInvalid);
        }
        if self.descriptor.tagline.is_empty() {
            self.ctx
                .reporter
                .warning("Datafile has no tagline; add one before publishing.");
        }
        descriptor::save(&self.datafile_path(), &self.descriptor)?;
        info!("wrote {}", self.datafile_path().display());

        if opts.clean {
            self.manifest.clear()?;
        }
        self.manifest.generate()
    }

    /// Every blob of the pack as `path -> hash`, including the manifest itself
    /// under its own name.
    pub fn blob_paths(&self) -> Result<BTreeMap<String, BlobHash>> {
        if !self.manifest.is_complete() {
            return Err(DataError::ManifestIncomplete);
        }
        let mut paths: BTreeMap<String, BlobHash> = self
            .manifest
            .entries()
            .filter_map(|(p, e)| e.hash().map(|h| (p.to_string(), h.clone())))
            .collect();
        paths.insert(MANIFEST.to_string(), self.manifest.manifest_hash()?);
        Ok(paths)
    }

    /// Blob hashes with the first path that carries each, deduplicated.
    fn unique_blobs(&self) -> Result<BTreeMap<BlobHash, String>> {
        let mut blobs = BTreeMap::new();
        for (path, hash) in self.blob_paths()? {
            blobs.entry(hash).or_insert(path);
        }
        Ok(blobs)
    }

    /// Hashes the blob store does not have yet.
    pub async fn missing_blobs(&self) -> Result<Vec<BlobHash>> {
        let checks = stream::iter(self.unique_blobs()?.into_keys())
            .map(|hash| async move {
                let present = self.ctx.blobs.has(hash.key().as_str()).await?;
                Ok::<_, DataError>((!present).then_some(hash))
            })
            .buffer_unordered(self.ctx.transfer_concurrency)
            .try_collect::<Vec<_>>()
            .await?;
        let mut missing: Vec<BlobHash> = checks.into_iter().flatten().collect();
        missing.sort();
        Ok(missing)
    }

    /// Upload every blob the store does not already have, the manifest
    /// included. Each distinct hash is uploaded at most once.
    pub async fn upload(&self) -> Result<TransferSummary> {
        let manifest_bytes = Bytes::from(self.manifest.canonical_bytes()?);
        let outcomes = stream::iter(self.unique_blobs()?)
            .map(|(hash, path)| self.upload_one(hash, path, manifest_bytes.clone()))
            .buffer_unordered(self.ctx.transfer_concurrency)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(TransferSummary::tally(&outcomes))
    }

    async fn upload_one(&self, hash: BlobHash, path: String, manifest: Bytes) -> Result<bool> {
        let store = self.ctx.blobs.as_ref();
        if store.has(hash.key().as_str()).await? {
            self.ctx.reporter.skipped(Direction::Upload, &path, &hash);
            return Ok(false);
        }
        if path == MANIFEST {
            push_blob(store, &hash, Box::new(Cursor::new(manifest))).await?;
        } else {
            push_file(store, &hash, &self.root.join(&path)).await?;
        }
        self.ctx.reporter.transferred(Direction::Upload, &path, &hash);
        Ok(true)
    }

    /// Download every blob whose local file is missing or differs.
    ///
    /// The local Manifest is what the paths were read from, so it is never
    /// replaced here.
    pub async fn download(&self) -> Result<TransferSummary> {
        let mut wanted = Vec::new();
        for (path, hash) in self.blob_paths()? {
            if path == MANIFEST && self.manifest.path().exists() {
                continue;
            }
            if normalize_path(&path)? != path {
                return Err(DataError::InvalidPath {
                    path,
                    reason: "manifest path is not in canonical form",
                });
            }
            wanted.push((path, hash));
        }

        let outcomes = stream::iter(wanted)
            .map(|(path, hash)| self.download_one(path, hash))
            .buffer_unordered(self.ctx.transfer_concurrency)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(TransferSummary::tally(&outcomes))
    }

    async fn download_one(&self, path: String, hash: BlobHash) -> Result<bool> {
        let dest = self.root.join(&path);
        if dest.is_file() {
            let local = dest.clone();
            let actual = tokio::task::spawn_blocking(move || hash_file(&local))
                .await
                .map_err(std::io::Error::other)?;
            if actual.is_ok_and(|h| h == hash) {
                self.ctx.reporter.skipped(Direction::Download, &path, &hash);
                return Ok(false);
            }
        }
        fetch_blob(self.ctx.blobs.as_ref(), &hash, &dest).await?;
        self.ctx
            .reporter
            .transferred(Direction::Download, &path, &hash);
        Ok(true)
    }

    /// Point the index at this pack's manifest for the Datafile's version.
    pub async fn publish(&self, force: bool) -> Result<PublishOutcome> {
        if !self.descriptor.is_valid() {
            return Err(DataError::DescriptorInvalid);
        }
        if !self.manifest.is_complete() {
            return Err(DataError::ManifestIncomplete);
        }
        let missing = self.missing_blobs().await?;
        if !missing.is_empty() {
            return Err(DataError::BlobsNotUploaded(missing.len()));
        }

        let handle = self.descriptor.handle();
        let hash = self.manifest.manifest_hash()?;
        let mut refs = RefIndex::new(self.ctx.index.clone(), handle.path());

        let existing = match refs.version_ref(&handle.version).await {
            Ok(r) => Some(r),
            Err(DataError::NoRefForVersion(_) | DataError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        if existing.as_ref() == Some(&hash) {
            debug!("{} already points at {}", handle, hash.short());
            return Ok(PublishOutcome::Unchanged {
                version: handle.version,
                hash,
            });
        }
        match &existing {
            Some(existing) if !force => {
                return Err(DataError::VersionConflict {
                    version: handle.version.clone(),
                    existing: existing.to_string(),
                    dataset: handle.dataset(),
                });
            }
            _ => {}
        }

        refs.put(&handle.version, &hash).await.map_err(|e| match e {
            DataError::Forbidden { .. } => DataError::Forbidden {
                user: self.ctx.user.clone(),
                dataset: handle.path(),
                owner: handle.author.clone(),
            },
            other => other,
        })?;

        Ok(PublishOutcome::Published {
            version: handle.version,
            hash,
            replaced: existing,
        })
    }

    /// Verify every tracked file. Returns the number of files checked.
    pub fn check(&self) -> Result<usize> {
        if !self.manifest.is_complete() {
            self.ctx
                .reporter
                .warning("Manifest has unhashed entries; they will fail the check.");
        }
        let total = self.manifest.len();
        let mut failed = 0;
        for path in self.manifest.paths() {
            if self.manifest.check(path)? == CheckOutcome::Fail {
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(DataError::ChecksumFailures { failed, total });
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::NoPrompt;
    use crate::hasher::hash_bytes;
    use crate::index::{IndexBackend, RefRecord};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Index that fails lookups or posts with canned errors.
    #[derive(Debug, Default)]
    struct FailingIndex {
        fail_fetch: bool,
        posts: AtomicUsize,
    }

    #[async_trait]
    impl IndexBackend for FailingIndex {
        async fn fetch_refs(&self, _path: &str) -> Result<RefRecord> {
            if self.fail_fetch {
                return Err(DataError::Transport {
                    status: 500,
                    message: "index exploded".into(),
                });
            }
            Ok(RefRecord::default())
        }

        async fn put_ref(&self, path: &str, _version: &str, _hash: &BlobHash) -> Result<()> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            Err(DataError::Forbidden {
                user: String::new(),
                dataset: path.to_string(),
                owner: String::new(),
            })
        }
    }

    fn make_pack(ctx: &Context) -> (tempfile::TempDir, Pack) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello\n").unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/c.txt"), "world\n").unwrap();
        fs::write(dir.path().join("b/dup.txt"), "hello\n").unwrap();

        let mut pack = Pack::open(ctx, dir.path()).unwrap();
        let opts = MakeOptions {
            dataset: Some("ana/foo@1.0".into()),
            tagline: Some("Foo".into()),
            ..MakeOptions::default()
        };
        pack.make(&opts, &NoPrompt).unwrap();
        (dir, pack)
    }

    #[test]
    fn make_writes_datafile_and_manifest() {
        let (ctx, _, _) = Context::in_memory("ana");
        let (dir, pack) = make_pack(&ctx);

        assert!(pack.manifest.is_complete());
        assert!(pack.manifest.contains(DATAFILE));
        let saved = descriptor::load(&dir.path().join(DATAFILE)).unwrap();
        assert_eq!(saved.dataset, "ana/foo@1.0");
        assert_eq!(saved.website, "http://datadex.io/ana/foo@1.0");

        let paths = pack.blob_paths().unwrap();
        assert_eq!(paths[MANIFEST], pack.manifest.manifest_hash().unwrap());
        assert_eq!(paths["a.txt"], hash_bytes(b"hello\n"));
    }

    #[test]
    fn make_rejects_invalid_dataset() {
        let (ctx, _, _) = Context::in_memory("ana");
        let dir = tempfile::tempdir().unwrap();
        let mut pack = Pack::open(&ctx, dir.path()).unwrap();
        let opts = MakeOptions {
            dataset: Some("Not A/Handle!@x".into()),
            ..MakeOptions::default()
        };
        assert!(matches!(
            pack.make(&opts, &NoPrompt),
            Err(DataError::DescriptorInvalid)
        ));
    }

    #[tokio::test]
    async fn upload_is_idempotent_and_deduplicates() {
        let (ctx, blobs, _) = Context::in_memory("ana");
        let (_dir, pack) = make_pack(&ctx);

        let unique = pack.unique_blobs().unwrap().len();
        assert_eq!(unique, pack.blob_paths().unwrap().len() - 1);

        let first = pack.upload().await.unwrap();
        assert_eq!(first.transferred, unique);
        assert_eq!(blobs.put_count(), unique);

        let second = pack.upload().await.unwrap();
        assert_eq!(second.transferred, 0);
        assert_eq!(second.skipped, unique);
        assert_eq!(blobs.put_count(), unique);

        let manifest_key = pack.manifest.manifest_hash().unwrap().key();
        assert!(blobs.contains(manifest_key.as_str()));
    }

    #[tokio::test]
    async fn publish_requires_uploaded_blobs() {
        let (ctx, _, index) = Context::in_memory("ana");
        let (_dir, pack) = make_pack(&ctx);

        let err = pack.publish(false).await.unwrap_err();
        assert!(matches!(err, DataError::BlobsNotUploaded(n) if n > 0));
        assert_eq!(index.post_count(), 0);
    }

    #[tokio::test]
    async fn publish_then_conflict_then_force() {
        let (ctx, _, index) = Context::in_memory("ana");
        let (dir, mut pack) = make_pack(&ctx);
        pack.upload().await.unwrap();

        let h1 = pack.manifest.manifest_hash().unwrap();
        assert!(matches!(
            pack.publish(false).await.unwrap(),
            PublishOutcome::Published { replaced: None, .. }
        ));
        assert_eq!(index.post_count(), 1);

        // republishing the same content posts nothing
        assert!(matches!(
            pack.publish(false).await.unwrap(),
            PublishOutcome::Unchanged { .. }
        ));
        assert_eq!(index.post_count(), 1);

        fs::write(dir.path().join("a.txt"), "changed\n").unwrap();
        pack.manifest.hash("a.txt").unwrap();
        pack.upload().await.unwrap();
        let h2 = pack.manifest.manifest_hash().unwrap();

        let err = pack.publish(false).await.unwrap_err();
        match err {
            DataError::VersionConflict { existing, dataset, .. } => {
                assert_eq!(existing, h1.to_string());
                assert_eq!(dataset, "ana/foo@1.0");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(index.post_count(), 1);

        match pack.publish(true).await.unwrap() {
            PublishOutcome::Published { hash, replaced, .. } => {
                assert_eq!(hash, h2);
                assert_eq!(replaced, Some(h1));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let mut refs = RefIndex::new(index.clone(), "ana/foo");
        assert_eq!(refs.version_ref("1.0").await.unwrap(), h2);
    }

    #[tokio::test]
    async fn publish_rejects_incomplete_manifest() {
        let (ctx, _, _) = Context::in_memory("ana");
        let (dir, mut pack) = make_pack(&ctx);
        fs::write(dir.path().join("new.txt"), "x").unwrap();
        pack.manifest.add("new.txt").unwrap();
        assert!(matches!(
            pack.publish(false).await,
            Err(DataError::ManifestIncomplete)
        ));
        assert!(matches!(pack.upload().await, Err(DataError::ManifestIncomplete)));
    }

    #[tokio::test]
    async fn download_restores_missing_and_changed_files() {
        let (ctx, blobs, _) = Context::in_memory("ana");
        let (dir, pack) = make_pack(&ctx);
        pack.upload().await.unwrap();
        let puts = blobs.put_count();

        fs::remove_file(dir.path().join("b/c.txt")).unwrap();
        fs::write(dir.path().join("a.txt"), "local edit\n").unwrap();

        let summary = pack.download().await.unwrap();
        assert_eq!(summary.transferred, 2);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "hello\n");
        assert_eq!(fs::read_to_string(dir.path().join("b/c.txt")).unwrap(), "world\n");
        assert_eq!(blobs.put_count(), puts);

        assert_eq!(pack.check().unwrap(), pack.manifest.len());
    }

    #[test]
    fn check_counts_failures() {
        let (ctx, _, _) = Context::in_memory("ana");
        let (dir, pack) = make_pack(&ctx);
        fs::write(dir.path().join("a.txt"), "tampered\n").unwrap();
        fs::remove_file(dir.path().join("b/c.txt")).unwrap();

        match pack.check().unwrap_err() {
            DataError::ChecksumFailures { failed, total } => {
                assert_eq!(failed, 2);
                assert_eq!(total, pack.manifest.len());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn publish_aborts_when_ref_lookup_fails() {
        let (mut ctx, _, _) = Context::in_memory("ana");
        let failing = Arc::new(FailingIndex {
            fail_fetch: true,
            ..FailingIndex::default()
        });
        ctx.index = failing.clone();
        let (_dir, pack) = make_pack(&ctx);
        pack.upload().await.unwrap();

        let err = pack.publish(true).await.unwrap_err();
        assert!(matches!(err, DataError::Transport { status: 500, .. }));
        assert_eq!(failing.posts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn publish_names_user_and_owner_when_forbidden() {
        let (mut ctx, _, _) = Context::in_memory("bob");
        let failing = Arc::new(FailingIndex::default());
        ctx.index = failing.clone();
        let (_dir, pack) = make_pack(&ctx);
        pack.upload().await.unwrap();

        match pack.publish(false).await.unwrap_err() {
            DataError::Forbidden {
                user,
                dataset,
                owner,
            } => {
                assert_eq!(user, "bob");
                assert_eq!(dataset, "ana/foo");
                assert_eq!(owner, "ana");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(failing.posts.load(Ordering::SeqCst), 1);
    }
}
