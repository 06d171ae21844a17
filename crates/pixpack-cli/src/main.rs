//! Pixpack CLI - Command-line interface for the pixpack asset manager

mod commands;
mod workspace;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{archive, asset};
use pixpack_core::PixpackError;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use workspace::Workspace;

#[derive(Parser)]
#[command(name = "pixpack")]
#[command(about = "Content-addressed image collection with portable archives", long_about = None)]
#[command(version)]
struct Cli {
    /// Store directory (overrides config and PIXPACK_STORE_DIR)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Read configuration from this file instead of the layered defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add image files to the store
    Add {
        /// Files to add
        files: Vec<PathBuf>,
    },

    /// List stored assets
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show one stored asset
    Info {
        /// Fingerprint, with or without the sha256: prefix
        fingerprint: String,
    },

    /// Replace the store with an archive's contents
    Import {
        /// Archive path or http(s) URL
        source: String,

        /// Write the archive's metadata here instead of printing it
        #[arg(long)]
        metadata_out: Option<PathBuf>,
    },

    /// Write the store to a new archive
    Export {
        /// JSON metadata file (defaults to the last imported metadata)
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Archive file name
        #[arg(long, default_value = pixpack_sync::DEFAULT_EXPORT_NAME)]
        name: String,
    },

    /// Save the store back to the archive it was imported from
    Save {
        /// JSON metadata file (defaults to the last imported metadata)
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Destination when no archive has been imported or saved yet
        #[arg(long = "as")]
        save_as: Option<PathBuf>,
    },

    /// Remove every asset and forget the saved archive location
    Clear,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut ws = Workspace::open(cli.store, cli.config.as_deref()).await?;

    match cli.command {
        Commands::Add { files } => asset::run_add(&ws, &files).await,
        Commands::List { format } => asset::run_list(&ws, &format).await,
        Commands::Info { fingerprint } => asset::run_info(&ws, &fingerprint).await,
        Commands::Clear => asset::run_clear(&mut ws).await,
        Commands::Import {
            source,
            metadata_out,
        } => archive::run_import(&mut ws, &source, metadata_out.as_deref()).await,
        Commands::Export {
            metadata,
            out,
            name,
        } => archive::run_export(&ws, metadata.as_deref(), &out, &name).await,
        Commands::Save { metadata, save_as } => {
            archive::run_save(&mut ws, metadata.as_deref(), save_as).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dispatch(cli).await {
        Err(e)
            if e
                .downcast_ref::<PixpackError>()
                .is_some_and(PixpackError::is_cancellation) =>
        {
            tracing::info!("{}", e);
            Ok(())
        }
        other => other,
    }
}
