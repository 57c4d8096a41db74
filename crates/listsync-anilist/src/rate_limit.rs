//! Retry-After handling for AniList rate limits
//!
//! AniList allows a fixed number of requests per minute and answers excess
//! requests with HTTP 429 plus a `Retry-After` header. Pacing itself lives in
//! the sync engine's rate governor; this module only interprets the header.

use std::time::Duration;

use tracing::warn;

/// Wait applied when the server signals a rate limit without saying how long
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Longest wait a `Retry-After` header can impose
const MAX_RETRY_AFTER_SECS: u64 = 3600;

/// Parses a `Retry-After` header value.
///
/// Accepts either delay-seconds (`"120"`) or an HTTP-date
/// (`"Wed, 21 Oct 2026 07:28:00 GMT"`). Delay-seconds are capped at one
/// hour. Dates in the past, dates more than an hour away, and unparsable
/// values yield `default`.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        if seconds > MAX_RETRY_AFTER_SECS {
            warn!(seconds, "Retry-After exceeds one hour, capping");
        }
        return Duration::from_secs(seconds.min(MAX_RETRY_AFTER_SECS));
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if target > now {
            let diff = target - now;
            if let Some(secs) = diff
                .num_seconds()
                .try_into()
                .ok()
                .filter(|&s: &u64| s <= MAX_RETRY_AFTER_SECS)
            {
                return Duration::from_secs(secs);
            }
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
