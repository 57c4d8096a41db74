//! Domain entities and business logic
//!
//! This module contains the core domain types for listsync:
//! - Newtypes for type-safe identifiers and credentials
//! - Sync entries and the partial field sets submitted per mutation
//! - Live batch progress and the terminal report
//! - The shared remote rate-limit state
//! - Domain-specific error types

pub mod entry;
pub mod errors;
pub mod newtypes;
pub mod progress;
pub mod rate_limit;
pub mod report;

// Re-export commonly used types
pub use entry::{EntryFields, MediaListStatus, PreviousValues, SyncEntry};
pub use errors::DomainError;
pub use newtypes::*;
pub use progress::SyncProgress;
pub use rate_limit::RateLimitState;
pub use report::{BatchStatus, EntryError, SyncReport, SyncResult};
