//! `data pack`: the dataset lifecycle from Datafile to published version.

use std::io::Write;

use anyhow::Result;
use data_core::{MakeOptions, Pack, PublishOutcome, TransferSummary};

use crate::ui::StdinPrompt;

/// Create or update the Datafile, then generate the manifest
pub fn make(opts: MakeOptions) -> Result<()> {
    let mut pack = super::open_pack()?;
    pack.make(&opts, &StdinPrompt)?;
    println!("Packed {} ({} files).", pack.descriptor.dataset, pack.manifest.len());
    Ok(())
}

/// Print the manifest as stored
pub fn manifest() -> Result<()> {
    let pack = super::open_pack()?;
    let bytes = pack.manifest.canonical_bytes()?;
    std::io::stdout().write_all(&bytes)?;
    Ok(())
}

fn summarize(verb: &str, summary: TransferSummary) {
    println!(
        "{} {} blobs ({} already present).",
        verb, summary.transferred, summary.skipped
    );
}

pub async fn upload() -> Result<()> {
    let pack = super::open_pack()?;
    summarize("Uploaded", pack.upload().await?);
    Ok(())
}

pub async fn download() -> Result<()> {
    let pack = super::open_pack()?;
    summarize("Downloaded", pack.download().await?);
    Ok(())
}

pub async fn publish(force: bool) -> Result<()> {
    let ctx = super::context()?;
    let pack = Pack::open(&ctx, &super::cwd()?)?;
    let dataset = pack.descriptor.dataset.clone();

    match pack.publish(force).await? {
        PublishOutcome::Unchanged { hash, .. } => ctx.reporter.success(&format!(
            "{} ({}) already published; nothing to do.",
            dataset,
            hash.short()
        )),
        PublishOutcome::Published { hash, replaced, .. } => {
            if let Some(old) = replaced {
                ctx.reporter
                    .warning(&format!("Overwrote {} ({}).", dataset, old.short()));
            }
            ctx.reporter
                .success(&format!("Published {} ({}).", dataset, hash.short()));
        }
    }
    ctx.reporter
        .info(&format!("Webpage at {}", ctx.dataset_url(&dataset)));
    Ok(())
}

/// Verify every tracked file against the manifest
pub fn check() -> Result<()> {
    let pack = super::open_pack()?;
    let total = pack.check()?;
    println!("All {total} checksums match.");
    Ok(())
}
