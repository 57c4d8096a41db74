//! Live progress snapshot of a running batch
//!
//! [`SyncProgress`] is owned and mutated by the batch orchestrator and
//! handed out by reference to progress sinks. The counters keep the
//! invariant `completed == successful + failed` at every observation;
//! skipped entries are tracked separately and never touch `completed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::SyncEntry;
use super::rate_limit::RateLimitState;

/// Progress of one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    /// Number of entries in the batch, fixed for its lifetime
    pub total: usize,
    /// Entries resolved as success or failure
    pub completed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Entries whose plan had no steps
    pub skipped: usize,
    /// Entry currently being processed, `None` between entries
    pub current_entry: Option<SyncEntry>,
    /// 1-based step counter, only set for multi-step plans
    pub current_step: Option<usize>,
    pub total_steps: Option<usize>,
    pub rate_limited: bool,
    pub retry_after: Option<DateTime<Utc>>,
}

impl SyncProgress {
    /// Creates a fresh snapshot for a batch of `total` entries
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            current_entry: None,
            current_step: None,
            total_steps: None,
            rate_limited: false,
            retry_after: None,
        }
    }

    /// Marks `entry` as the one being processed
    ///
    /// Step counters are only populated when the plan has more than one
    /// step; direct updates leave them unset.
    pub fn begin_entry(&mut self, entry: &SyncEntry, plan_len: usize) {
        self.current_entry = Some(entry.clone());
        if plan_len > 1 {
            self.current_step = Some(1);
            self.total_steps = Some(plan_len);
        } else {
            self.current_step = None;
            self.total_steps = None;
        }
    }

    /// Advances the 1-based step counter (no-op for direct updates)
    pub fn set_step(&mut self, step: usize) {
        if self.total_steps.is_some() {
            self.current_step = Some(step);
        }
    }

    pub fn record_success(&mut self) {
        self.successful += 1;
        self.completed += 1;
        self.clear_current();
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
        self.completed += 1;
        self.clear_current();
    }

    /// Counts a skipped entry; `completed` is left unchanged
    pub fn record_skip(&mut self) {
        self.skipped += 1;
        self.clear_current();
    }

    /// Mirrors the rate governor's state into the snapshot
    pub fn apply_rate_limit(&mut self, state: &RateLimitState) {
        self.rate_limited = state.is_rate_limited;
        self.retry_after = state.retry_after;
    }

    pub fn clear_current(&mut self) {
        self.current_entry = None;
        self.current_step = None;
        self.total_steps = None;
    }

    /// Entries not yet resolved (neither completed nor skipped)
    pub fn remaining(&self) -> usize {
        self.total
            .saturating_sub(self.completed)
            .saturating_sub(self.skipped)
    }

    /// Fraction of the batch resolved, in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed + self.skipped) as f64 / self.total as f64
    }

    /// Checks the counter invariants
    pub fn is_consistent(&self) -> bool {
        self.completed == self.successful + self.failed
            && self.completed <= self.total
            && self.completed + self.skipped <= self.total
    }
}
