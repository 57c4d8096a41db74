//! AniList GraphQL client
//!
//! Provides a typed HTTP client for the AniList GraphQL endpoint. Handles the
//! bearer header, the `{query, variables}` request body, response envelope
//! parsing, and classification of HTTP / GraphQL errors into [`AniListError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use listsync_anilist::client::AniListClient;
//!
//! # async fn example() -> Result<(), listsync_anilist::AniListError> {
//! let client = AniListClient::new();
//! let data: serde_json::Value = client
//!     .graphql("access-token", "query { Viewer { id } }", serde_json::json!({}))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use listsync_core::config::{AniListConfig, DEFAULT_API_URL};
use reqwest::{header::RETRY_AFTER, Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::rate_limit::{parse_retry_after, DEFAULT_RETRY_AFTER};
use crate::AniListError;

// ============================================================================
// GraphQL envelope types
// ============================================================================

/// Body of every GraphQL request
#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

/// Standard GraphQL response envelope
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

/// One entry of the `errors` array
///
/// AniList adds a non-standard `status` carrying the HTTP-like code of the
/// failure (400 validation, 404 not found, 429 rate limit, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub status: Option<u16>,
}

// ============================================================================
// AniListClient
// ============================================================================

/// Default per-request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for AniList GraphQL calls
///
/// The access token is supplied per call, so one client can serve every
/// batch of a session.
#[derive(Debug, Clone)]
pub struct AniListClient {
    /// The underlying HTTP client
    client: Client,
    /// GraphQL endpoint URL
    base_url: String,
}

impl AniListClient {
    /// Creates a client for the public AniList endpoint
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_URL)
    }

    /// Creates a client with a custom endpoint URL (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_http_client(DEFAULT_TIMEOUT).unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Creates a client from the `anilist` configuration section
    ///
    /// # Errors
    /// Returns [`AniListError::NetworkError`] if the HTTP client cannot be built.
    pub fn from_config(config: &AniListConfig) -> Result<Self, AniListError> {
        Ok(Self {
            client: build_http_client(config.request_timeout())?,
            base_url: config.api_url.clone(),
        })
    }

    /// Returns the GraphQL endpoint URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an authenticated POST request to the GraphQL endpoint
    pub fn request(&self, access_token: &str) -> RequestBuilder {
        self.client
            .post(&self.base_url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Executes a GraphQL document and deserializes its `data` member
    ///
    /// # Arguments
    /// * `access_token` - Bearer token of the user
    /// * `query` - GraphQL document
    /// * `variables` - JSON object of variables; absent keys are not sent
    ///
    /// # Errors
    /// - [`AniListError::TooManyRequests`] on HTTP 429 or a GraphQL error with status 429
    /// - [`AniListError::Unauthorized`] on HTTP 401/403
    /// - [`AniListError::ServerError`] on HTTP 5xx
    /// - [`AniListError::Rejected`] on other 4xx or GraphQL errors
    /// - [`AniListError::NetworkError`] if no response was received
    /// - [`AniListError::InvalidResponse`] if the body cannot be parsed or
    ///   carries no `data`
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        access_token: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, AniListError> {
        self.graphql_data(access_token, query, variables)
            .await?
            .ok_or_else(|| AniListError::InvalidResponse("response has no data".to_string()))
    }

    /// Like [`graphql`](Self::graphql), but a missing or null `data` member
    /// is `Ok(None)` instead of an error
    pub async fn graphql_data<T: DeserializeOwned>(
        &self,
        access_token: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<Option<T>, AniListError> {
        let body = GraphQlRequest { query, variables };

        let response = self.request(access_token).json(&body).send().await?;
        let status = response.status();

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER));

        let text = response.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "GraphQL response received");

        let envelope = serde_json::from_str::<GraphQlResponse<T>>(&text);

        if !status.is_success() {
            let errors = envelope.map(|e| e.errors).unwrap_or_default();
            return Err(classify_http_error(status, retry_after, &errors, &text));
        }

        let envelope = envelope
            .map_err(|e| AniListError::InvalidResponse(format!("Failed to parse body: {e}")))?;

        if let Some(err) = classify_graphql_errors(&envelope.errors) {
            return Err(err);
        }

        Ok(envelope.data)
    }
}

impl Default for AniListClient {
    fn default() -> Self {
        Self::new()
    }
}

fn build_http_client(timeout: Duration) -> Result<Client, AniListError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

// ============================================================================
// Error classification
// ============================================================================

/// Maps a non-2xx response to an error
fn classify_http_error(
    status: StatusCode,
    retry_after: Option<Duration>,
    errors: &[GraphQlError],
    body: &str,
) -> AniListError {
    let message = errors
        .first()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    if status == StatusCode::TOO_MANY_REQUESTS || errors.iter().any(is_rate_limit) {
        warn!(
            status = status.as_u16(),
            retry_after_ms = retry_after.map(|d| d.as_millis() as u64),
            "AniList rate limit hit"
        );
        return AniListError::TooManyRequests {
            retry_after,
            message,
        };
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AniListError::Unauthorized(message),
        s if s.is_server_error() => AniListError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => AniListError::Rejected {
            status: Some(s.as_u16()),
            message,
        },
    }
}

/// Maps GraphQL errors in a 2xx response to an error, if any are present
fn classify_graphql_errors(errors: &[GraphQlError]) -> Option<AniListError> {
    let first = errors.first()?;

    if errors.iter().any(is_rate_limit) {
        warn!("AniList rate limit reported in GraphQL errors");
        return Some(AniListError::TooManyRequests {
            retry_after: None,
            message: first.message.clone(),
        });
    }

    Some(AniListError::Rejected {
        status: first.status,
        message: first.message.clone(),
    })
}

fn is_rate_limit(error: &GraphQlError) -> bool {
    error.status == Some(429)
}
