//! data - dataset packaging CLI

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use data_cli::cmd;
use data_cli::{BlobCommands, Cli, Commands, ManifestCommands, PackCommands};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("data: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::List => cmd::list::list(),
        Commands::Get { datasets } => cmd::get::get(&datasets).await,
        Commands::Blob { command } => match command {
            BlobCommands::Put { targets } => cmd::blob::put(&targets).await,
            BlobCommands::Get { targets } => cmd::blob::get(&targets).await,
        },
        Commands::Manifest { command } => match command {
            None => cmd::manifest::generate(),
            Some(ManifestCommands::Add { paths }) => cmd::manifest::add(&paths),
            Some(ManifestCommands::Rm { paths }) => cmd::manifest::remove(&paths),
            Some(ManifestCommands::Hash { paths }) => cmd::manifest::hash(&paths),
            Some(ManifestCommands::Check { paths }) => cmd::manifest::check(&paths),
        },
        Commands::Pack { command } => match command {
            PackCommands::Make {
                clean,
                interactive,
                dataset,
                tagline,
                description,
                license,
            } => cmd::pack::make(data_core::MakeOptions {
                clean,
                interactive,
                dataset,
                tagline,
                description,
                license,
            }),
            PackCommands::Manifest => cmd::pack::manifest(),
            PackCommands::Upload => cmd::pack::upload().await,
            PackCommands::Download => cmd::pack::download().await,
            PackCommands::Publish { force } => cmd::pack::publish(force).await,
            PackCommands::Check => cmd::pack::check(),
        },
    }
}
