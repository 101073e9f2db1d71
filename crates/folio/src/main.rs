//! Folio CLI - static project-page generator.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Render project detail pages from JSON data and handlebars templates")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Project root containing templates/, data/ and asset directories
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Path to folio.toml, relative to the project root
    #[arg(short, long, default_value = "folio.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site once (the default)
    Build {
        /// Output directory (defaults to config or "build/dist")
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build, then rebuild whenever templates or data change
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let config_path = cli.root.join(&cli.config);

    // Execute command
    match cli.command {
        None => {
            commands::build::run(&cli.root, &config_path, None).await?;
        }
        Some(Commands::Build { output }) => {
            commands::build::run(&cli.root, &config_path, output).await?;
        }
        Some(Commands::Watch) => {
            commands::watch::run(&cli.root, &config_path).await?;
        }
    }

    Ok(())
}
