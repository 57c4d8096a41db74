//! Retry command - Re-run the entries that failed in an earlier run
//!
//! Reads the original entries file and the report saved by
//! `listsync sync --report-out`, then synchronizes only the entries listed
//! as failed, in their original order. The earlier report is not modified.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::batch::{load_entries, load_report, resolve_token, run_batch_command, BatchMode};
use super::CommandContext;

#[derive(Debug, Args)]
pub struct RetryCommand {
    /// JSON file with the entries of the original run
    #[arg(long)]
    pub entries: PathBuf,

    /// Report saved by the original run
    #[arg(long)]
    pub report: PathBuf,

    /// Split large progress jumps into several updates
    #[arg(long)]
    pub incremental: bool,

    /// Save the retry report to this file
    #[arg(long)]
    pub report_out: Option<PathBuf>,

    /// AniList access token (overrides environment and config file)
    #[arg(long)]
    pub token: Option<String>,
}

impl RetryCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let mut config = ctx.config.clone();
        if self.incremental {
            config.sync.incremental = true;
        }

        let entries = load_entries(&self.entries)?;
        let prior = load_report(&self.report)?;
        let token = resolve_token(&config, self.token.as_deref())?;

        info!(
            prior_run = %prior.run_id,
            failed = prior.errors.len(),
            "Retrying failed entries"
        );

        run_batch_command(
            ctx,
            &config,
            entries,
            BatchMode::RetryFrom(&prior),
            &token,
            self.report_out.as_deref(),
        )
        .await
    }
}
