//! listsync AniList - AniList GraphQL API adapter
//!
//! Provides async access to the AniList GraphQL endpoint:
//! - Authenticated GraphQL requests with per-request timeouts
//! - `SaveMediaListEntry` mutations carrying only the fields being changed
//! - Classification of HTTP and GraphQL errors, including rate limits
//!
//! ## Modules
//!
//! - [`client`] - GraphQL HTTP client and error classification
//! - [`provider`] - [`IListService`](listsync_core::ports::IListService) implementation
//! - [`rate_limit`] - `Retry-After` header parsing

pub mod client;
pub mod provider;
pub mod rate_limit;

use std::time::Duration;

use listsync_core::ports::ListServiceError;
use thiserror::Error;

/// Errors that can occur when communicating with the AniList API
#[derive(Debug, Error)]
pub enum AniListError {
    /// The access token was rejected (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limit exceeded (HTTP 429 or a GraphQL error with status 429)
    #[error("Too many requests: {message}")]
    TooManyRequests {
        /// Wait requested by the server, `None` if it did not say
        retry_after: Option<Duration>,
        message: String,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The request was rejected (validation error, not found, other 4xx)
    #[error("Request rejected: {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<AniListError> for ListServiceError {
    fn from(err: AniListError) -> Self {
        match err {
            AniListError::Unauthorized(message) => ListServiceError::Unauthorized(message),
            AniListError::TooManyRequests {
                retry_after,
                message,
            } => ListServiceError::RateLimited {
                retry_after,
                message,
            },
            AniListError::ServerError { status, message } => {
                ListServiceError::Server { status, message }
            }
            AniListError::Rejected { status, message } => {
                ListServiceError::Rejected { status, message }
            }
            AniListError::NetworkError(e) => ListServiceError::Network(e.to_string()),
            AniListError::InvalidResponse(message) => ListServiceError::InvalidResponse(message),
        }
    }
}
