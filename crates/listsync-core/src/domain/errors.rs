//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures for identifiers, credentials and entries.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid media identifier
    #[error("Invalid media ID: {0}")]
    InvalidMediaId(String),

    /// Missing or malformed access token
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// Unknown list status value
    #[error("Invalid list status: {0}")]
    InvalidStatus(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}
