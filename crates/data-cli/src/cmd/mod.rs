//! Command implementations. Each delegates to `data_core` and reports
//! through [`crate::ui::Console`].

pub mod blob;
pub mod get;
pub mod list;
pub mod manifest;
pub mod pack;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use data_core::{Config, Context, Pack};

use crate::ui::Console;

pub(crate) fn cwd() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to read the working directory")
}

/// Context for the main index from the user's config.
pub(crate) fn context() -> Result<Context> {
    let config = Config::load()?;
    Ok(Context::from_config(&config, Arc::new(Console::new()))?)
}

/// The dataset in the working directory.
pub(crate) fn open_pack() -> Result<Pack> {
    let ctx = context()?;
    Ok(Pack::open(&ctx, &cwd()?)?)
}
