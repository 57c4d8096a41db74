//! Remote rate-limit state
//!
//! The single piece of state shared beyond one batch. It is written only by
//! the rate governor and read by anything that wants to display it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the remote service is currently throttling us
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub is_rate_limited: bool,
    /// Absolute time at which requests may resume
    pub retry_after: Option<DateTime<Utc>>,
    /// Human-readable explanation for display
    pub message: Option<String>,
}

impl RateLimitState {
    /// State for a throttle that lifts at `until`
    pub fn limited(until: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            is_rate_limited: true,
            retry_after: Some(until),
            message: Some(message.into()),
        }
    }

    /// Time left until `retry_after`, zero if it has passed or is unset
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        match self.retry_after {
            Some(until) if until > now => until - now,
            _ => chrono::Duration::zero(),
        }
    }
}
