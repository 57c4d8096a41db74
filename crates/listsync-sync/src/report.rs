//! Report builder
//!
//! Folds per-entry results and the final progress counters into a
//! [`SyncReport`]. Pure: no I/O, no clock. The run id and timestamp are
//! inputs, so the same inputs always produce the same report.

use chrono::{DateTime, Utc};
use listsync_core::domain::newtypes::RunId;
use listsync_core::domain::progress::SyncProgress;
use listsync_core::domain::report::{EntryError, SyncReport, SyncResult};

/// Message used for a failed result that carries no error text
const UNKNOWN_ERROR: &str = "unknown error";

pub struct ReportBuilder;

impl ReportBuilder {
    /// Builds the terminal report of one batch run
    ///
    /// Success and failure counts come from `results`; the entry total and
    /// the skip count come from `progress`, since skipped entries produce
    /// no result. Errors keep the order of `results`.
    pub fn build(
        results: &[SyncResult],
        progress: &SyncProgress,
        run_id: RunId,
        timestamp: DateTime<Utc>,
    ) -> SyncReport {
        let (successful, failed) = results.iter().fold((0, 0), |(ok, err), r| {
            if r.success {
                (ok + 1, err)
            } else {
                (ok, err + 1)
            }
        });

        let errors = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| EntryError {
                media_id: r.media_id,
                error: r
                    .error
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            })
            .collect();

        SyncReport {
            run_id,
            total_entries: progress.total,
            successful_updates: successful,
            failed_updates: failed,
            skipped_entries: progress.skipped,
            errors,
            timestamp,
        }
    }
}
