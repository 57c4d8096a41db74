//! List service port (driven/secondary port)
//!
//! This module defines the interface for submitting list mutations to the
//! remote tracking service. The primary implementation targets AniList's
//! GraphQL API, but the sync engine only depends on this trait.
//!
//! ## Design Notes
//!
//! - Errors are a typed enum rather than `anyhow` because the engine must
//!   tell rate limits, transient failures and rejections apart.
//! - Uses `#[async_trait]` for async trait methods.
//! - A mutation carries exactly the fields set in [`EntryFields`]; absent
//!   fields keep their remote value.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entry::{EntryFields, MediaListStatus};
use crate::domain::newtypes::{AccessToken, MediaId};

// ============================================================================
// SavedEntry
// ============================================================================

/// Remote entry as echoed back by a successful mutation
///
/// The default value is an echo with nothing confirmed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedEntry {
    /// Remote list-entry id; `None` when the service did not confirm one
    pub id: Option<i64>,
    pub status: Option<MediaListStatus>,
    pub progress: Option<u32>,
    pub score: Option<f64>,
    pub private: Option<bool>,
}

impl SavedEntry {
    /// An echo carrying only the confirming id
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            status: None,
            progress: None,
            score: None,
            private: None,
        }
    }
}

// ============================================================================
// ListServiceError
// ============================================================================

/// Errors returned by a list service adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListServiceError {
    /// HTTP 429 or an explicit rate-limit error from the service
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Server-supplied wait, if any
        retry_after: Option<Duration>,
        message: String,
    },

    /// Credentials were rejected (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The mutation was rejected (validation error, not found, other 4xx)
    #[error("Rejected: {message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The response could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ListServiceError {
    /// Returns true for rate-limit signals
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ListServiceError::RateLimited { .. })
    }

    /// Returns true for errors worth retrying with backoff (5xx, network)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ListServiceError::Server { .. } | ListServiceError::Network(_)
        )
    }

    /// Message suitable for a report: the server's own text where available
    pub fn report_message(&self) -> String {
        match self {
            ListServiceError::RateLimited { message, .. } => message.clone(),
            ListServiceError::Unauthorized(message) => message.clone(),
            ListServiceError::Rejected { message, .. } => message.clone(),
            ListServiceError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// IListService trait
// ============================================================================

/// Port trait for the remote list service
#[async_trait]
pub trait IListService: Send + Sync {
    /// Creates or updates the list entry for `media_id`
    ///
    /// Only the fields set in `fields` are submitted.
    ///
    /// # Arguments
    /// * `token` - Bearer token of the user whose list is modified
    /// * `media_id` - Remote identifier of the target item
    /// * `fields` - Partial field set for this mutation
    async fn save_entry(
        &self,
        token: &AccessToken,
        media_id: MediaId,
        fields: &EntryFields,
    ) -> Result<SavedEntry, ListServiceError>;
}
