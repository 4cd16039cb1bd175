//! `data manifest`: generate the manifest, or edit single entries.

use std::sync::Arc;

use anyhow::{Result, bail};
use data_core::{CheckOutcome, Manifest, Reporter};

use crate::ui::Console;

fn load() -> Result<Manifest> {
    Ok(Manifest::load(&super::cwd()?)?.with_reporter(Arc::new(Console::new())))
}

/// Track and hash every file in the working directory
pub fn generate() -> Result<()> {
    let mut manifest = load()?;
    manifest.generate()?;
    Ok(())
}

pub fn add(paths: &[String]) -> Result<()> {
    let mut manifest = load()?;
    for path in paths {
        manifest.add(path)?;
    }
    Ok(())
}

pub fn remove(paths: &[String]) -> Result<()> {
    let mut manifest = load()?;
    for path in paths {
        if !manifest.remove(path)? {
            Console::new().warning(&format!("{path} was not tracked"));
        }
    }
    Ok(())
}

pub fn hash(paths: &[String]) -> Result<()> {
    let mut manifest = load()?;
    for path in paths {
        manifest.hash(path)?;
    }
    Ok(())
}

pub fn check(paths: &[String]) -> Result<()> {
    let manifest = load()?;
    let mut failed = 0;
    for path in paths {
        if manifest.check(path)? == CheckOutcome::Fail {
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{}/{} checksums failed!", failed, paths.len());
    }
    Ok(())
}
