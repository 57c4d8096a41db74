//! Request-rate governor
//!
//! The [`RateGovernor`] enforces a fixed spacing between outbound mutations
//! and owns the session-wide [`RateLimitState`].
//!
//! ## Pacing
//!
//! The spacing is `60s / requests_per_minute`, applied before every request
//! except the first of a batch. This is a fixed-interval governor rather than
//! a token bucket: it never bursts, so a batch that starts after a quiet
//! period is paced exactly like one that follows another batch.
//!
//! ## Rate-limit pauses
//!
//! When the remote service answers with a rate-limit signal the orchestrator
//! calls [`RateGovernor::observe_rate_limit`], sleeps for the returned delay,
//! then calls [`RateGovernor::clear`] and retries the same step. The state is
//! written only through this type; everybody else reads a snapshot via
//! [`RateGovernor::state`].

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use listsync_core::config::RateLimitingConfig;
use listsync_core::domain::rate_limit::RateLimitState;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fallback wait when the server gives no Retry-After
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Result of a cancellable wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full delay elapsed and no cancellation was requested
    Elapsed,
    /// The token fired before or during the wait
    Cancelled,
}

impl WaitOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitOutcome::Cancelled)
    }
}

/// Sleeps for `delay` unless `cancel` fires first.
///
/// Cancellation is checked before sleeping and again on waking, so a token
/// cancelled at the exact moment the timer completes still wins.
pub async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> WaitOutcome {
    if cancel.is_cancelled() {
        return WaitOutcome::Cancelled;
    }
    if !delay.is_zero() {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return WaitOutcome::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    if cancel.is_cancelled() {
        WaitOutcome::Cancelled
    } else {
        WaitOutcome::Elapsed
    }
}

/// Fixed-interval request governor with a shared rate-limit flag
#[derive(Debug)]
pub struct RateGovernor {
    /// Minimum spacing between two requests
    min_interval: Duration,
    /// Wait applied when a rate-limit signal carries no delay
    default_retry_after: Duration,
    state: Mutex<RateLimitState>,
}

impl RateGovernor {
    /// Creates a governor for a budget of `requests_per_minute`.
    ///
    /// A budget of zero is treated as one request per minute.
    pub fn new(requests_per_minute: u32, default_retry_after: Duration) -> Self {
        let rpm = u64::from(requests_per_minute.max(1));
        Self {
            min_interval: Duration::from_millis(60_000 / rpm),
            default_retry_after,
            state: Mutex::new(RateLimitState::default()),
        }
    }

    /// Creates a governor from the `rate_limiting` configuration section
    pub fn from_config(config: &RateLimitingConfig) -> Self {
        Self {
            min_interval: config.min_interval(),
            default_retry_after: config.default_retry_after(),
            state: Mutex::new(RateLimitState::default()),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn default_retry_after(&self) -> Duration {
        self.default_retry_after
    }

    /// Delay to observe before the next request.
    ///
    /// Zero for the first request of a batch, `min_interval` otherwise.
    pub fn should_delay(&self, is_first_request: bool) -> Duration {
        if is_first_request {
            Duration::ZERO
        } else {
            self.min_interval
        }
    }

    /// Records a remote rate-limit signal and returns how long to pause.
    ///
    /// Sets `is_rate_limited`, `retry_after = now + delay`, and a message
    /// for display. `delay` is `retry_after` if the server supplied one,
    /// otherwise the configured default.
    pub fn observe_rate_limit(&self, retry_after: Option<Duration>, message: &str) -> Duration {
        let delay = retry_after.unwrap_or(self.default_retry_after);
        let until = Utc::now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::seconds(60));

        let wait = format_wait(delay);
        let display = if message.is_empty() {
            format!("Rate limited, retrying in {wait}")
        } else {
            format!("{message} (retrying in {wait})")
        };

        warn!(
            retry_after_ms = delay.as_millis() as u64,
            server_supplied = retry_after.is_some(),
            "Remote rate limit observed, pausing"
        );

        *self.lock() = RateLimitState::limited(until, display);
        delay
    }

    /// Time left on an active rate limit, if any.
    ///
    /// Used before issuing a request so that a pause recorded by an earlier
    /// batch is still honoured.
    ///
    /// A flag whose window has already passed is cleared here, so a pause
    /// that nobody slept through (e.g. a cancelled batch) does not linger.
    pub fn pending_wait(&self) -> Option<Duration> {
        let mut state = self.lock();
        if !state.is_rate_limited {
            return None;
        }
        let remaining = state
            .remaining(Utc::now())
            .to_std()
            .ok()
            .filter(|d| !d.is_zero());
        if remaining.is_none() {
            debug!("Rate limit window elapsed while idle, clearing");
            *state = RateLimitState::default();
        }
        remaining
    }

    /// Clears the flag if its window has passed; returns true if still limited
    pub fn expire_elapsed(&self) -> bool {
        self.pending_wait().is_some()
    }

    /// Clears the flag once the pause has elapsed
    pub fn clear(&self) {
        let mut state = self.lock();
        if state.is_rate_limited {
            debug!("Rate limit window elapsed, resuming");
        }
        *state = RateLimitState::default();
    }

    /// Explicit external reset, e.g. before a user-initiated retry
    pub fn reset(&self) {
        info!("Rate limit state reset");
        *self.lock() = RateLimitState::default();
    }

    /// Snapshot of the current state
    pub fn state(&self) -> RateLimitState {
        self.lock().clone()
    }

    pub fn is_rate_limited(&self) -> bool {
        self.lock().is_rate_limited
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RateLimitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// `"750ms"` below one second, whole seconds rounded up otherwise
fn format_wait(delay: Duration) -> String {
    if delay < Duration::from_secs(1) {
        format!("{}ms", delay.as_millis())
    } else {
        let secs = delay.as_secs() + u64::from(delay.subsec_nanos() > 0);
        format!("{secs}s")
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::from_config(&RateLimitingConfig::default())
    }
}
