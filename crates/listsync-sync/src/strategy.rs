//! Entry update strategy
//!
//! Decides how one [`SyncEntry`] is written to the remote list: skipped,
//! as one mutation with the full target field set, or as three mutations
//! in "incremental" mode.
//!
//! ## Incremental mode
//!
//! AniList merges closely-timed small progress bumps into one activity-feed
//! entry, while one large jump produces a single odd-looking activity. For a
//! progress delta greater than one, incremental mode submits:
//!
//! 1. `progress = previous + 1`
//! 2. `progress = target`
//! 3. `status`, `score` and `private` targets
//!
//! This only shapes the remote feed; the end state is the same either way.

use listsync_core::config::SyncConfig;
use listsync_core::domain::entry::{EntryFields, MediaListStatus, SyncEntry};

// ============================================================================
// SyncStepPlan
// ============================================================================

/// Ordered mutations for one entry
///
/// Empty only when the entry is skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStepPlan {
    steps: Vec<EntryFields>,
}

impl SyncStepPlan {
    /// A plan with no steps (the entry is skipped)
    pub fn skip() -> Self {
        Self { steps: Vec::new() }
    }

    /// A single mutation
    pub fn single(fields: EntryFields) -> Self {
        Self {
            steps: vec![fields],
        }
    }

    pub fn from_steps(steps: Vec<EntryFields>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[EntryFields] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns true for multi-step plans
    pub fn is_incremental(&self) -> bool {
        self.steps.len() > 1
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EntryFields> {
        self.steps.iter()
    }
}

impl<'a> IntoIterator for &'a SyncStepPlan {
    type Item = &'a EntryFields;
    type IntoIter = std::slice::Iter<'a, EntryFields>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

// ============================================================================
// PlanStrategy
// ============================================================================

/// Computes the step plan of an entry
///
/// Pluggable so the orchestrator does not care whether incremental stepping
/// is in use.
pub trait PlanStrategy: Send + Sync {
    fn plan(&self, entry: &SyncEntry) -> SyncStepPlan;
}

/// Default strategy: direct or incremental updates, with optional
/// preservation of completed entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlanner {
    incremental: bool,
    preserve_completed: bool,
}

impl StepPlanner {
    pub fn new(incremental: bool, preserve_completed: bool) -> Self {
        Self {
            incremental,
            preserve_completed,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.incremental, config.preserve_completed_status)
    }

    pub fn incremental(&self) -> bool {
        self.incremental
    }

    pub fn preserve_completed(&self) -> bool {
        self.preserve_completed
    }
}

impl Default for StepPlanner {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl PlanStrategy for StepPlanner {
    fn plan(&self, entry: &SyncEntry) -> SyncStepPlan {
        let Some(previous) = entry.previous_values.as_ref() else {
            return SyncStepPlan::single(entry.target_fields());
        };

        if self.preserve_completed && previous.status == MediaListStatus::Completed {
            return SyncStepPlan::skip();
        }

        let delta = i64::from(entry.target_progress) - i64::from(previous.progress);
        if !self.incremental || delta <= 1 {
            return SyncStepPlan::single(entry.target_fields());
        }

        SyncStepPlan::from_steps(vec![
            EntryFields::progress_only(previous.progress + 1),
            EntryFields::progress_only(entry.target_progress),
            EntryFields {
                status: Some(entry.target_status),
                progress: None,
                score: Some(entry.target_score),
                private: Some(entry.target_private),
            },
        ])
    }
}
