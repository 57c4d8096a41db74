//! listsync Sync - Batch list synchronization engine
//!
//! Provides:
//! - Sequential batch synchronization against a remote list service
//! - Session-wide rate limiting with automatic pause and resume
//! - Direct and incremental (activity-feed friendly) update plans
//! - Cooperative cancellation and retry of failed entries
//!
//! ## Modules
//!
//! - [`engine`] - Batch orchestrator driving entries through their plans
//! - [`governor`] - Request spacing and the shared rate-limit state
//! - [`strategy`] - Per-entry step plans
//! - [`updater`] - One mutation per step, with transient-error backoff
//! - [`report`] - Terminal report construction
//! - [`retry`] - Failed-entry selection for retries
//! - [`sink`] - Channel-backed progress sink

pub mod engine;
pub mod governor;
pub mod report;
pub mod retry;
pub mod sink;
pub mod strategy;
pub mod updater;

#[cfg(test)]
mod testing;

use thiserror::Error;

pub use engine::{BatchOrchestrator, BatchRun, CANCELLED_WHILE_RATE_LIMITED};
pub use governor::RateGovernor;
pub use sink::ChannelProgressSink;
pub use strategy::{PlanStrategy, StepPlanner, SyncStepPlan};
pub use updater::BackoffPolicy;

/// Errors that abort a batch before any entry is processed
///
/// Entry-level failures never surface here; they are recorded in the
/// batch report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The batch contained no entries
    #[error("No entries to synchronize")]
    EmptyBatch,

    /// No usable access token was supplied
    #[error("No access token available")]
    MissingToken,

    /// A retry was requested but the prior report lists no failed entries
    #[error("No failed entries to retry")]
    NothingToRetry,
}
