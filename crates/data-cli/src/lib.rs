//! data - package, publish and install datasets
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! A dataset is a directory with a `Datafile` (who and what it is) and a
//! `Manifest` (every file and its SHA-1). Files are stored as blobs keyed by
//! their hash; a ref index maps `author/name@version` to the hash of the
//! manifest.
//!
//! # Directory Layout
//!
//! ```text
//! <dataset>/
//! ├── Datafile    # dataset: author/name@version, tagline, ...
//! ├── Manifest    # path: sha1 for every tracked file
//! └── datasets/   # installed dependencies, never tracked
//!     └── <author>/<name>/
//! ```

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "data")]
#[command(author, version, about = "data - package, publish and install datasets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List installed datasets
    List,
    /// Download and install datasets
    Get {
        /// Datasets to install: author/name or author/name@version.
        /// Without any, installs the dependencies listed in the Datafile.
        datasets: Vec<String>,
    },
    /// Manage individual blobs
    Blob {
        #[command(subcommand)]
        command: BlobCommands,
    },
    /// Generate and edit the dataset manifest
    Manifest {
        #[command(subcommand)]
        command: Option<ManifestCommands>,
    },
    /// Dataset packaging, upload and publishing
    Pack {
        #[command(subcommand)]
        command: PackCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum BlobCommands {
    /// Upload blobs to the blob store
    Put {
        /// Tracked paths or hashes
        #[arg(required = true)]
        targets: Vec<String>,
    },
    /// Download blobs from the blob store
    Get {
        /// Tracked paths or hashes
        #[arg(required = true)]
        targets: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ManifestCommands {
    /// Start tracking files
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Stop tracking files
    #[command(alias = "remove")]
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Hash tracked files and record the result
    Hash {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Verify files against their recorded hashes
    Check {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PackCommands {
    /// Create or update the Datafile and generate the manifest
    Make {
        /// Rebuild the manifest from scratch
        #[arg(long)]
        clean: bool,
        /// Also ask for optional Datafile fields
        #[arg(short, long)]
        interactive: bool,
        /// Dataset handle, author/name@version
        #[arg(long)]
        dataset: Option<String>,
        #[arg(long)]
        tagline: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        license: Option<String>,
    },
    /// Print the manifest
    Manifest,
    /// Upload the dataset's blobs
    Upload,
    /// Download the dataset's blobs
    Download,
    /// Publish the dataset version to the index
    Publish {
        /// Overwrite a version that was published with different contents
        #[arg(short, long)]
        force: bool,
    },
    /// Verify every tracked file
    Check,
}
