//! Batch synchronization engine
//!
//! The [`BatchOrchestrator`] pushes an ordered list of [`SyncEntry`] values
//! to the remote list service, one entry and one step at a time.
//!
//! ## Batch Flow
//!
//! 1. **Setup**: reject empty batches and missing tokens before anything runs
//! 2. **Per entry**: plan the steps, then for every step wait for the rate
//!    window, submit the mutation and classify the outcome
//! 3. **Rate limits**: pause the whole batch, then retry the same step
//! 4. **Bookkeeping**: fold the results into a [`SyncReport`]
//!
//! ## Cancellation
//!
//! Cancellation is cooperative. The token is checked before every step and
//! after every wait, and all waits race against it. A call already in
//! flight when the token fires is allowed to finish, but its result is
//! discarded. Mutations that were already applied are not undone.
//!
//! ## Counting
//!
//! `completed == successful + failed` holds at every published snapshot.
//! Skipped entries (plan with no steps) are counted in `skipped` only and
//! never touch `completed`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use listsync_core::config::Config;
use listsync_core::domain::entry::SyncEntry;
use listsync_core::domain::newtypes::{AccessToken, RunId};
use listsync_core::domain::progress::SyncProgress;
use listsync_core::domain::rate_limit::RateLimitState;
use listsync_core::domain::report::{BatchStatus, SyncReport, SyncResult};
use listsync_core::ports::list_service::IListService;
use listsync_core::ports::progress_sink::IProgressSink;

use crate::governor::{sleep_or_cancel, RateGovernor};
use crate::report::ReportBuilder;
use crate::retry::select_retryable;
use crate::strategy::{PlanStrategy, StepPlanner, SyncStepPlan};
use crate::updater::{BackoffPolicy, SingleEntryUpdater, StepOutcome, NO_ID_RETURNED};
use crate::SyncError;

/// Error recorded for an entry whose rate-limit pause was cancelled
pub const CANCELLED_WHILE_RATE_LIMITED: &str = "rate limited, sync cancelled while waiting";

// ============================================================================
// BatchRun
// ============================================================================

/// Everything a finished batch hands back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRun {
    /// Why the batch stopped
    pub status: BatchStatus,
    /// Final progress snapshot
    pub progress: SyncProgress,
    /// Terminal report (partial if cancelled)
    pub report: SyncReport,
}

impl BatchRun {
    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }
}

// ============================================================================
// Per-run context
// ============================================================================

/// How one entry ended
enum EntryOutcome {
    Succeeded { entry_id: i64 },
    Failed { error: String },
    /// The batch must stop; `failure` is set when the entry is still recorded
    /// as failed (cancelled during a rate-limit pause)
    Cancelled { failure: Option<String> },
}

/// Borrowed inputs shared by every entry of a run
struct RunContext<'a> {
    token: &'a AccessToken,
    sink: Option<&'a dyn IProgressSink>,
    cancel: &'a CancellationToken,
}

impl RunContext<'_> {
    /// Hands the snapshot to the sink; a panicking sink is logged and ignored
    fn publish(&self, progress: &SyncProgress) {
        debug_assert!(progress.is_consistent(), "inconsistent progress: {progress:?}");
        let Some(sink) = self.sink else {
            return;
        };
        if panic::catch_unwind(AssertUnwindSafe(|| sink.on_progress(progress))).is_err() {
            warn!("Progress sink panicked, snapshot dropped");
        }
    }
}

/// Mutable state of a run
struct RunState {
    progress: SyncProgress,
    results: Vec<SyncResult>,
    first_request: bool,
}

// ============================================================================
// BatchOrchestrator
// ============================================================================

/// Sequential batch synchronizer
///
/// One batch runs at a time; callers must serialize concurrent batches.
///
/// ## Dependencies
///
/// - `updater`: one mutation per step, with transient-error backoff
/// - `planner`: direct or incremental step plans
/// - `governor`: request spacing and the session-wide rate-limit state
pub struct BatchOrchestrator {
    updater: SingleEntryUpdater,
    planner: Arc<dyn PlanStrategy>,
    governor: Arc<RateGovernor>,
}

impl BatchOrchestrator {
    /// Creates an orchestrator with the default planner and backoff
    ///
    /// The governor is shared so its state outlives a single batch.
    pub fn new(service: Arc<dyn IListService>, governor: Arc<RateGovernor>) -> Self {
        Self {
            updater: SingleEntryUpdater::new(service, BackoffPolicy::default()),
            planner: Arc::new(StepPlanner::default()),
            governor,
        }
    }

    /// Creates an orchestrator with its own governor, configured from `config`
    pub fn from_config(service: Arc<dyn IListService>, config: &Config) -> Self {
        Self {
            updater: SingleEntryUpdater::new(
                service,
                BackoffPolicy::from_config(&config.rate_limiting),
            ),
            planner: Arc::new(StepPlanner::from_config(&config.sync)),
            governor: Arc::new(RateGovernor::from_config(&config.rate_limiting)),
        }
    }

    /// Replaces the plan strategy
    pub fn with_planner(mut self, planner: Arc<dyn PlanStrategy>) -> Self {
        self.planner = planner;
        self
    }

    /// Replaces the transient-error backoff policy
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.updater = self.updater.with_backoff(backoff);
        self
    }

    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    /// Read access to the shared rate-limit state for display
    pub fn rate_limit_state(&self) -> RateLimitState {
        self.governor.state()
    }

    /// Step plan the orchestrator would execute for `entry`
    pub fn plan(&self, entry: &SyncEntry) -> SyncStepPlan {
        self.planner.plan(entry)
    }

    /// Runs one batch to completion or cancellation
    ///
    /// # Arguments
    /// * `entries` - Ordered entries; duplicates are not collapsed
    /// * `token` - Access token of the list owner
    /// * `sink` - Receives a snapshot after every progress change
    /// * `cancel` - Cooperative cancellation; `None` runs to completion
    ///
    /// # Errors
    /// Only setup errors: [`SyncError::EmptyBatch`] and
    /// [`SyncError::MissingToken`]. Entry failures end up in the report.
    #[tracing::instrument(skip_all, fields(entries = entries.len()))]
    pub async fn run_batch(
        &self,
        entries: Vec<SyncEntry>,
        token: &str,
        sink: Option<&dyn IProgressSink>,
        cancel: Option<CancellationToken>,
    ) -> Result<BatchRun, SyncError> {
        if entries.is_empty() {
            return Err(SyncError::EmptyBatch);
        }
        let token = AccessToken::new(token).map_err(|_| SyncError::MissingToken)?;
        let cancel = cancel.unwrap_or_default();

        let ctx = RunContext {
            token: &token,
            sink,
            cancel: &cancel,
        };
        Ok(self.execute(&entries, &ctx).await)
    }

    /// Re-runs the entries that failed in `prior` as an independent batch
    ///
    /// Resets the rate governor first: a manual retry is the user's signal
    /// that they want to try again now.
    ///
    /// # Errors
    /// [`SyncError::NothingToRetry`] if no entry of `entries` failed in
    /// `prior`, plus the setup errors of [`run_batch`](Self::run_batch).
    #[tracing::instrument(
        skip_all,
        fields(prior_run = %prior.run_id, prior_errors = prior.errors.len())
    )]
    pub async fn retry_failed(
        &self,
        entries: &[SyncEntry],
        prior: &SyncReport,
        token: &str,
        sink: Option<&dyn IProgressSink>,
        cancel: Option<CancellationToken>,
    ) -> Result<BatchRun, SyncError> {
        let subset = select_retryable(entries, prior);
        if subset.is_empty() {
            return Err(SyncError::NothingToRetry);
        }

        self.governor.reset();
        info!(entries = subset.len(), "Retrying failed entries");
        self.run_batch(subset, token, sink, cancel).await
    }

    async fn execute(&self, entries: &[SyncEntry], ctx: &RunContext<'_>) -> BatchRun {
        let run_id = RunId::new();
        let mut state = RunState {
            progress: SyncProgress::new(entries.len()),
            results: Vec::with_capacity(entries.len()),
            first_request: true,
        };
        self.governor.expire_elapsed();
        state.progress.apply_rate_limit(&self.governor.state());
        let mut status = BatchStatus::Completed;

        info!(%run_id, total = entries.len(), "Starting batch");
        ctx.publish(&state.progress);

        for entry in entries {
            if ctx.cancel.is_cancelled() {
                status = BatchStatus::Cancelled;
                break;
            }
            let media_id = entry.media_id;

            if let Err(err) = entry.validate() {
                warn!(media_id = media_id.get(), error = %err, "Entry rejected before submission");
                state.results.push(SyncResult::failed(media_id, err.to_string()));
                state.progress.record_failure();
                ctx.publish(&state.progress);
                continue;
            }

            let plan = self.planner.plan(entry);
            if plan.is_empty() {
                debug!(media_id = media_id.get(), "Entry completed remotely, skipping");
                state.progress.record_skip();
                ctx.publish(&state.progress);
                continue;
            }

            state.progress.begin_entry(entry, plan.len());
            ctx.publish(&state.progress);

            match self.process_entry(entry, &plan, ctx, &mut state).await {
                EntryOutcome::Succeeded { entry_id } => {
                    debug!(media_id = media_id.get(), entry_id, "Entry synchronized");
                    state.results.push(SyncResult::succeeded(media_id, entry_id));
                    state.progress.record_success();
                    ctx.publish(&state.progress);
                }
                EntryOutcome::Failed { error } => {
                    warn!(media_id = media_id.get(), %error, "Entry failed");
                    state.results.push(SyncResult::failed(media_id, error));
                    state.progress.record_failure();
                    ctx.publish(&state.progress);
                }
                EntryOutcome::Cancelled { failure } => {
                    match failure {
                        Some(error) => {
                            state.results.push(SyncResult::failed(media_id, error));
                            state.progress.record_failure();
                        }
                        None => state.progress.clear_current(),
                    }
                    ctx.publish(&state.progress);
                    status = BatchStatus::Cancelled;
                    break;
                }
            }
        }

        let report = ReportBuilder::build(&state.results, &state.progress, run_id, Utc::now());

        info!(
            %run_id,
            %status,
            successful = report.successful_updates,
            failed = report.failed_updates,
            skipped = report.skipped_entries,
            "Batch finished"
        );

        BatchRun {
            status,
            progress: state.progress,
            report,
        }
    }

    /// Runs every step of one entry; stops at the first failing step
    async fn process_entry(
        &self,
        entry: &SyncEntry,
        plan: &SyncStepPlan,
        ctx: &RunContext<'_>,
        state: &mut RunState,
    ) -> EntryOutcome {
        let media_id = entry.media_id;
        let mut entry_id = None;

        for (index, fields) in plan.iter().enumerate() {
            let step = index + 1;
            if step > 1 {
                state.progress.set_step(step);
                ctx.publish(&state.progress);
            }

            loop {
                // awaiting-rate-window
                if ctx.cancel.is_cancelled() {
                    return EntryOutcome::Cancelled { failure: None };
                }
                if let Some(remaining) = self.governor.pending_wait() {
                    info!(
                        media_id = media_id.get(),
                        wait_ms = remaining.as_millis() as u64,
                        "Rate limit still active, waiting"
                    );
                    if sleep_or_cancel(remaining, ctx.cancel).await.is_cancelled() {
                        return EntryOutcome::Cancelled {
                            failure: Some(CANCELLED_WHILE_RATE_LIMITED.to_string()),
                        };
                    }
                    self.resume_after_pause(ctx, state);
                } else if state.progress.rate_limited {
                    // Window passed between snapshots
                    state.progress.apply_rate_limit(&self.governor.state());
                    ctx.publish(&state.progress);
                }
                let delay = self.governor.should_delay(state.first_request);
                if sleep_or_cancel(delay, ctx.cancel).await.is_cancelled() {
                    return EntryOutcome::Cancelled { failure: None };
                }
                state.first_request = false;

                // executing-step
                debug!(
                    media_id = media_id.get(),
                    step,
                    total_steps = plan.len(),
                    %fields,
                    "Executing step"
                );
                let outcome = self
                    .updater
                    .apply_step(ctx.token, media_id, fields, ctx.cancel)
                    .await;

                if ctx.cancel.is_cancelled() {
                    debug!(
                        media_id = media_id.get(),
                        step,
                        "Cancelled while step was in flight, discarding result"
                    );
                    return EntryOutcome::Cancelled { failure: None };
                }

                match outcome {
                    StepOutcome::Success { entry_id: id } => {
                        entry_id = Some(id);
                        break;
                    }
                    StepOutcome::Failed { error } => return EntryOutcome::Failed { error },
                    StepOutcome::Cancelled => return EntryOutcome::Cancelled { failure: None },
                    StepOutcome::RateLimited {
                        retry_after,
                        message,
                    } => {
                        let wait = self.governor.observe_rate_limit(retry_after, &message);
                        state.progress.apply_rate_limit(&self.governor.state());
                        ctx.publish(&state.progress);

                        if sleep_or_cancel(wait, ctx.cancel).await.is_cancelled() {
                            warn!(
                                media_id = media_id.get(),
                                step,
                                "Cancelled during rate-limit pause"
                            );
                            return EntryOutcome::Cancelled {
                                failure: Some(CANCELLED_WHILE_RATE_LIMITED.to_string()),
                            };
                        }

                        self.resume_after_pause(ctx, state);
                        info!(media_id = media_id.get(), step, "Retrying step after rate limit");
                    }
                }
            }
        }

        match entry_id {
            Some(entry_id) => EntryOutcome::Succeeded { entry_id },
            None => EntryOutcome::Failed {
                error: NO_ID_RETURNED.to_string(),
            },
        }
    }

    fn resume_after_pause(&self, ctx: &RunContext<'_>, state: &mut RunState) {
        self.governor.clear();
        state.progress.apply_rate_limit(&self.governor.state());
        ctx.publish(&state.progress);
    }
}
