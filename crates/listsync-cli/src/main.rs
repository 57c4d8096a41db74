//! listsync CLI - Command-line interface for listsync
//!
//! Provides commands for:
//! - Pushing a batch of reading-list entries to AniList
//! - Retrying the failed entries of an earlier run
//! - Previewing step plans without network calls
//! - Inspecting configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use listsync_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, plan::PlanCommand,
    retry::RetryCommand, sync::SyncCommand, CommandContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "listsync", version, about = "Push reading progress to AniList")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hide live progress
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize a batch of entries
    Sync(SyncCommand),
    /// Re-run the entries that failed in an earlier report
    Retry(RetryCommand),
    /// Show the update steps of every entry without sending anything
    Plan(PlanCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Picks the log filter: `-v` wins, then `RUST_LOG`, then `logging.level`
fn log_filter(verbose: u8, configured: &str) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Logs always go to stderr; with --json they are JSON lines too
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, &config.logging.level))
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let ctx = CommandContext {
        format,
        quiet: cli.quiet,
        config_path,
        config,
    };

    match cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Retry(cmd) => cmd.execute(&ctx).await,
        Commands::Plan(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    }
}
