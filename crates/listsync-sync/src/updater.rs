//! Single-entry updater
//!
//! Issues one mutation for one step of one entry and classifies the result.
//! 5xx and network failures are retried here with a bounded exponential
//! backoff scoped to the step; rate limits are handed back to the caller
//! untouched so the whole batch can pause.

use std::sync::Arc;
use std::time::Duration;

use listsync_core::config::RateLimitingConfig;
use listsync_core::domain::entry::EntryFields;
use listsync_core::domain::newtypes::{AccessToken, MediaId};
use listsync_core::ports::list_service::{IListService, ListServiceError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::governor::sleep_or_cancel;

/// Message recorded when the service confirms a mutation without an id
pub const NO_ID_RETURNED: &str = "no id returned";

// ============================================================================
// BackoffPolicy
// ============================================================================

/// Bounded exponential backoff for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles every retry
    pub base_delay: Duration,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &RateLimitingConfig) -> Self {
        Self::new(
            config.server_error_max_retries,
            config.server_error_base_delay(),
        )
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RateLimitingConfig::default())
    }
}

// ============================================================================
// StepOutcome
// ============================================================================

/// Classified result of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The mutation was applied and confirmed
    Success { entry_id: i64 },
    /// The service is throttling; not a failure of the entry
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },
    /// The mutation was rejected or retries were exhausted
    Failed { error: String },
    /// Cancellation fired during a backoff wait
    Cancelled,
}

// ============================================================================
// SingleEntryUpdater
// ============================================================================

/// Applies one step of one entry against an [`IListService`]
#[derive(Clone)]
pub struct SingleEntryUpdater {
    service: Arc<dyn IListService>,
    backoff: BackoffPolicy,
}

impl SingleEntryUpdater {
    pub fn new(service: Arc<dyn IListService>, backoff: BackoffPolicy) -> Self {
        Self { service, backoff }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Submits `fields` for `media_id` and classifies the outcome
    ///
    /// Never touches progress or report state.
    pub async fn apply_step(
        &self,
        token: &AccessToken,
        media_id: MediaId,
        fields: &EntryFields,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        let mut attempt = 0;
        loop {
            debug!(media_id = media_id.get(), attempt, %fields, "Submitting step");

            match self.service.save_entry(token, media_id, fields).await {
                Ok(saved) => {
                    if attempt > 0 {
                        info!(media_id = media_id.get(), attempt, "Step succeeded after retry");
                    }
                    return match saved.id {
                        Some(entry_id) => StepOutcome::Success { entry_id },
                        None => {
                            warn!(media_id = media_id.get(), "Mutation returned no entry id");
                            StepOutcome::Failed {
                                error: NO_ID_RETURNED.to_string(),
                            }
                        }
                    };
                }
                Err(ListServiceError::RateLimited {
                    retry_after,
                    message,
                }) => {
                    return StepOutcome::RateLimited {
                        retry_after,
                        message,
                    };
                }
                Err(err) if err.is_transient() && attempt < self.backoff.max_retries => {
                    let delay = self.backoff.delay_for(attempt);
                    warn!(
                        media_id = media_id.get(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient error, retrying"
                    );
                    if sleep_or_cancel(delay, cancel).await.is_cancelled() {
                        return StepOutcome::Cancelled;
                    }
                    attempt += 1;
                }
                Err(err) => {
                    warn!(media_id = media_id.get(), attempt, error = %err, "Step failed");
                    return StepOutcome::Failed {
                        error: err.report_message(),
                    };
                }
            }
        }
    }
}
