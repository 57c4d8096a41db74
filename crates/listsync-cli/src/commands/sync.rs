//! Sync command - Push a batch of entries to AniList
//!
//! Provides the `listsync sync` CLI command which:
//! 1. Loads the entries file and resolves the access token
//! 2. Builds the AniList adapter and the batch orchestrator
//! 3. Runs the batch with live progress; Ctrl-C cancels cooperatively
//! 4. Prints the report and optionally saves it for `listsync retry`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::batch::{load_entries, resolve_token, run_batch_command, BatchMode};
use super::CommandContext;

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// JSON file with the entries to synchronize
    #[arg(long)]
    pub entries: PathBuf,

    /// Split large progress jumps into several updates
    #[arg(long)]
    pub incremental: bool,

    /// Save the final report to this file
    #[arg(long)]
    pub report_out: Option<PathBuf>,

    /// AniList access token (overrides environment and config file)
    #[arg(long)]
    pub token: Option<String>,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let mut config = ctx.config.clone();
        if self.incremental {
            config.sync.incremental = true;
        }

        let entries = load_entries(&self.entries)?;
        let token = resolve_token(&config, self.token.as_deref())?;

        info!(
            entries = entries.len(),
            incremental = config.sync.incremental,
            "Starting sync"
        );

        run_batch_command(
            ctx,
            &config,
            entries,
            BatchMode::Full,
            &token,
            self.report_out.as_deref(),
        )
        .await
    }
}
