//! Resorts CLI
//!
//! A command-line interface for managing resort records and their photos.

mod commands;
mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use crate::commands::resorts::ResortsCommand;
use crate::config::ResortsConfig;

/// Resorts CLI: manage resort records and their photos.
#[derive(Parser, Debug)]
#[command(name = "resorts", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        env = "RESORTS_CONFIG",
        default_value = "resorts.toml",
        global = true
    )]
    config: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: ResortsCommand,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ResortsConfig::load(&cli.config)?;
    let catalog = config.build_catalog().await?;

    commands::resorts::run(&catalog, &cli.command, &cli.format).await
}
