//! Installing published datasets into `datasets/<author>/<name>` and listing
//! what is installed.

use std::path::{Path, PathBuf};

use data_schema::{Descriptor, Handle};
use tracing::{debug, info};

use crate::context::Context;
use crate::descriptor;
use crate::error::{DataError, Result};
use crate::index::RefIndex;
use crate::io::fetch_blob;
use crate::pack::Pack;
use crate::paths::{DATAFILE, DATASETS_DIR, MANIFEST, install_path};

/// A dataset installed by [`get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    /// The handle with its version resolved.
    pub handle: Handle,
    pub path: PathBuf,
}

/// Install `handle` below `cwd`.
///
/// The version is resolved against the index (`latest` and other aliases
/// included), the install directory is replaced, the manifest blob is
/// fetched and verified, and every blob it lists is downloaded.
pub async fn get(ctx: &Context, cwd: &Path, handle: &Handle) -> Result<Installed> {
    let mut refs = RefIndex::new(ctx.index.clone(), handle.path());
    let version = refs.ref_version(&handle.version).await.map_err(|e| match e {
        DataError::NotFound(_) => DataError::NotFound(handle.dataset()),
        other => other,
    })?;
    let manifest_hash = refs.version_ref(&version).await?;
    let resolved = Handle::new(&handle.author, &handle.name, &version);
    debug!("{} -> {}", resolved, manifest_hash.short());

    let dir = install_path(cwd, &resolved);
    if dir.exists() {
        tokio::fs::remove_dir_all(&dir)
            .await
            .map_err(|e| DataError::io_at(&dir, e))?;
    }
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| DataError::io_at(&dir, e))?;

    fetch_blob(ctx.blobs.as_ref(), &manifest_hash, &dir.join(MANIFEST)).await?;
    let pack = Pack::open(ctx, &dir)?;
    let summary = pack.download().await?;
    info!(
        "installed {} ({} files fetched, {} present)",
        resolved, summary.transferred, summary.skipped
    );

    ctx.reporter
        .success(&format!("Installed {} at {}", resolved, dir.display()));
    Ok(Installed {
        handle: resolved,
        path: dir,
    })
}

/// Install each dataset in `datasets`. With none given, install the valid
/// dependencies listed in the Datafile in `cwd`.
pub async fn get_all(ctx: &Context, cwd: &Path, datasets: &[String]) -> Result<Vec<Installed>> {
    let handles = if datasets.is_empty() {
        let descriptor = descriptor::load_or_default(&cwd.join(DATAFILE));
        let mut deps = Vec::new();
        for dep in &descriptor.dependencies {
            match Handle::parse(dep) {
                Ok(h) => deps.push(h),
                Err(e) => ctx.reporter.warning(&format!("skipping dependency: {e}")),
            }
        }
        if deps.is_empty() {
            return Err(DataError::NothingToGet);
        }
        deps
    } else {
        datasets
            .iter()
            .map(|d| Handle::parse(d).map_err(DataError::from))
            .collect::<Result<Vec<_>>>()?
    };

    let mut installed = Vec::with_capacity(handles.len());
    for handle in &handles {
        installed.push(get(ctx, cwd, handle).await?);
    }
    Ok(installed)
}

/// A dataset found under `datasets/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledDataset {
    pub path: PathBuf,
    pub descriptor: Descriptor,
}

/// Every installed dataset below `cwd`, sorted by path. Directories without
/// a readable Datafile are reported through `ctx` and skipped.
pub fn list_installed(ctx: &Context, cwd: &Path) -> Result<Vec<InstalledDataset>> {
    let root = cwd.join(DATASETS_DIR);
    let mut found = Vec::new();
    for author in visible_dirs(&root)? {
        for dataset in visible_dirs(&author)? {
            match descriptor::load(&dataset.join(DATAFILE)) {
                Ok(descriptor) => found.push(InstalledDataset {
                    path: dataset,
                    descriptor,
                }),
                Err(e) => ctx
                    .reporter
                    .warning(&format!("skipping {}: {}", dataset.display(), e)),
            }
        }
    }
    Ok(found)
}

fn visible_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(DataError::io_at(dir, e)),
    };
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DataError::io_at(dir, e))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
