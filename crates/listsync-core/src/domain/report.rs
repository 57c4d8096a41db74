//! Per-entry results and the terminal batch report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{MediaId, RunId};

/// Outcome of one entry that was resolved as success or failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub media_id: MediaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Remote list-entry id assigned on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<i64>,
}

impl SyncResult {
    pub fn succeeded(media_id: MediaId, entry_id: i64) -> Self {
        Self {
            success: true,
            media_id,
            error: None,
            entry_id: Some(entry_id),
        }
    }

    pub fn failed(media_id: MediaId, error: impl Into<String>) -> Self {
        Self {
            success: false,
            media_id,
            error: Some(error.into()),
            entry_id: None,
        }
    }
}

/// One failed entry in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryError {
    pub media_id: MediaId,
    pub error: String,
}

/// How a batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every entry was processed (some may have failed)
    Completed,
    /// The caller cancelled the batch; the report covers partial progress
    Cancelled,
}

impl BatchStatus {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BatchStatus::Cancelled)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal summary of one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: RunId,
    pub total_entries: usize,
    pub successful_updates: usize,
    pub failed_updates: usize,
    pub skipped_entries: usize,
    /// Failed entries in processing order
    pub errors: Vec<EntryError>,
    pub timestamp: DateTime<Utc>,
}

impl SyncReport {
    /// Returns true if any entry failed
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of entries that were resolved (success, failure or skip)
    pub fn processed(&self) -> usize {
        self.successful_updates + self.failed_updates + self.skipped_entries
    }

    /// Returns true if `media_id` is listed among the failures
    pub fn failed_media(&self, media_id: MediaId) -> bool {
        self.errors.iter().any(|e| e.media_id == media_id)
    }
}
