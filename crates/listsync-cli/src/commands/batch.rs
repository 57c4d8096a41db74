//! Shared plumbing for the batch commands (`sync` and `retry`)
//!
//! Loads entries and reports, wires the AniList adapter into the
//! orchestrator, renders live progress on a separate task and prints the
//! final report.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use listsync_anilist::client::AniListClient;
use listsync_anilist::provider::AniListService;
use listsync_core::config::{Config, TOKEN_ENV_VAR};
use listsync_core::domain::entry::SyncEntry;
use listsync_core::domain::progress::SyncProgress;
use listsync_core::domain::report::SyncReport;
use listsync_sync::engine::{BatchOrchestrator, BatchRun};
use listsync_sync::sink::ChannelProgressSink;
use listsync_sync::SyncError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::CommandContext;
use crate::output::OutputFormatter;

// ============================================================================
// Files
// ============================================================================

/// Reads a JSON array of entries
pub fn load_entries(path: &Path) -> Result<Vec<SyncEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entries file {}", path.display()))?;
    let entries: Vec<SyncEntry> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse entries file {}", path.display()))?;
    info!(path = %path.display(), entries = entries.len(), "Loaded entries");
    Ok(entries)
}

/// Reads a report written by an earlier `sync --report-out`
pub fn load_report(path: &Path) -> Result<SyncReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report {}", path.display()))
}

pub fn save_report(path: &Path, report: &SyncReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    info!(path = %path.display(), run_id = %report.run_id, "Saved report");
    Ok(())
}

// ============================================================================
// Wiring
// ============================================================================

/// Resolves the access token from `--token`, the environment or the config file
pub fn resolve_token(config: &Config, explicit: Option<&str>) -> Result<String> {
    config.resolve_token(explicit).with_context(|| {
        format!(
            "No AniList access token. Pass --token or set {} (or anilist.access_token in the config file)",
            TOKEN_ENV_VAR
        )
    })
}

pub fn build_orchestrator(config: &Config) -> Result<BatchOrchestrator> {
    let client =
        AniListClient::from_config(&config.anilist).context("Failed to create AniList client")?;
    let service = Arc::new(AniListService::new(client));
    Ok(BatchOrchestrator::from_config(service, config))
}

/// Returns a token that is cancelled on the first Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, stopping after the current request");
                trigger.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });
    cancel
}

// ============================================================================
// Progress rendering
// ============================================================================

/// Turns progress snapshots into one line per visible change
#[derive(Debug, Default)]
pub struct ProgressRenderer {
    /// (1-based position, step) of the last rendered entry line
    last_line: Option<(usize, Option<usize>)>,
    rate_limited: bool,
}

impl ProgressRenderer {
    pub fn render(&mut self, progress: &SyncProgress) -> Option<String> {
        if progress.rate_limited != self.rate_limited {
            self.rate_limited = progress.rate_limited;
            let line = match (progress.rate_limited, progress.retry_after) {
                (true, Some(at)) => format!(
                    "Rate limited by AniList, resuming at {}",
                    at.format("%H:%M:%S UTC")
                ),
                (true, None) => "Rate limited by AniList, waiting".to_string(),
                (false, _) => "Rate limit lifted, resuming".to_string(),
            };
            return Some(line);
        }

        let entry = progress.current_entry.as_ref()?;
        let position = progress.completed + progress.skipped + 1;
        let key = (position, progress.current_step);
        if self.last_line == Some(key) {
            return None;
        }
        self.last_line = Some(key);

        let mut line = format!("[{}/{}] {}", position, progress.total, entry.display_name());
        if let (Some(step), Some(total)) = (progress.current_step, progress.total_steps) {
            line.push_str(&format!(" (step {}/{})", step, total));
        }
        Some(line)
    }
}

/// Renders snapshots on a task of its own until the sender is dropped
pub fn spawn_progress_renderer(
    mut rx: UnboundedReceiver<SyncProgress>,
    formatter: Box<dyn OutputFormatter + Send + Sync>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut renderer = ProgressRenderer::default();
        while let Some(progress) = rx.recv().await {
            if let Some(line) = renderer.render(&progress) {
                formatter.progress(&line);
            }
        }
    })
}

// ============================================================================
// Running a batch
// ============================================================================

/// Which batch operation to run
pub enum BatchMode<'a> {
    /// Every entry
    Full,
    /// Only the entries that failed in the given report
    RetryFrom(&'a SyncReport),
}

/// Runs a batch end to end: progress, cancellation, output, saved report
pub async fn run_batch_command(
    ctx: &CommandContext,
    config: &Config,
    entries: Vec<SyncEntry>,
    mode: BatchMode<'_>,
    token: &str,
    report_out: Option<&Path>,
) -> Result<()> {
    let formatter = ctx.formatter();
    let orchestrator = build_orchestrator(config)?;

    let (sink, rx) = ChannelProgressSink::channel();
    let renderer = spawn_progress_renderer(rx, ctx.formatter());
    let cancel = cancel_on_ctrl_c();

    let result = match mode {
        BatchMode::Full => {
            orchestrator
                .run_batch(entries, token, Some(&sink), Some(cancel))
                .await
        }
        BatchMode::RetryFrom(prior) => {
            orchestrator
                .retry_failed(&entries, prior, token, Some(&sink), Some(cancel))
                .await
        }
    };

    drop(sink);
    if let Err(e) = renderer.await {
        warn!(error = %e, "Progress renderer stopped unexpectedly");
    }

    let run = match result {
        Ok(run) => run,
        Err(SyncError::NothingToRetry) => {
            formatter.success("No failed entries to retry");
            return Ok(());
        }
        Err(e) => return Err(e).context("Batch did not start"),
    };

    if let Some(path) = report_out {
        save_report(path, &run.report)?;
    }
    print_run(&run, formatter.as_ref(), ctx.format.is_json(), report_out);
    Ok(())
}

fn print_run(
    run: &BatchRun,
    formatter: &dyn OutputFormatter,
    json: bool,
    report_out: Option<&Path>,
) {
    let report = &run.report;

    if json {
        formatter.print_json(&serde_json::json!({
            "status": run.status,
            "report": report,
        }));
        return;
    }

    if run.is_cancelled() {
        formatter.warn("Sync cancelled; the report covers processed entries only");
    }

    formatter.success(&format!(
        "Synced {} of {} entr{}",
        report.successful_updates,
        report.total_entries,
        if report.total_entries == 1 { "y" } else { "ies" }
    ));
    if report.skipped_entries > 0 {
        formatter.info(&format!(
            "Skipped:  {} (already completed)",
            report.skipped_entries
        ));
    }
    formatter.info(&format!("Run ID:   {}", report.run_id));
    if let Some(path) = report_out {
        formatter.info(&format!("Report:   {}", path.display()));
    }

    if report.has_errors() {
        formatter.error(&format!(
            "{} entr{} failed:",
            report.failed_updates,
            if report.failed_updates == 1 { "y" } else { "ies" }
        ));
        for err in &report.errors {
            formatter.info(&format!("  - media {}: {}", err.media_id, err.error));
        }
        if report_out.is_some() {
            formatter.info("");
            formatter.info("Run 'listsync retry --entries <FILE> --report <REPORT>' to retry them");
        }
    }
}
