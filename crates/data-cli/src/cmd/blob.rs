//! `data blob put|get`: move single tracked blobs, addressed by path or hash.

use anyhow::Result;
use data_core::{Direction, Pack};
use data_core::io::{fetch_blob, push_file};

/// Upload the blobs of tracked paths or hashes
pub async fn put(targets: &[String]) -> Result<()> {
    let ctx = super::context()?;
    let pack = Pack::open(&ctx, &super::cwd()?)?;
    for target in targets {
        let (hash, path) = pack.manifest.pair(target)?;
        push_file(ctx.blobs.as_ref(), &hash, &pack.root().join(&path)).await?;
        ctx.reporter.transferred(Direction::Upload, &path, &hash);
    }
    Ok(())
}

/// Download the blobs of tracked paths or hashes, verifying each
pub async fn get(targets: &[String]) -> Result<()> {
    let ctx = super::context()?;
    let pack = Pack::open(&ctx, &super::cwd()?)?;
    for target in targets {
        let (hash, path) = pack.manifest.pair(target)?;
        fetch_blob(ctx.blobs.as_ref(), &hash, &pack.root().join(&path)).await?;
        ctx.reporter.transferred(Direction::Download, &path, &hash);
    }
    Ok(())
}
