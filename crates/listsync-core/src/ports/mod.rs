//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync engine
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IListService`] - Remote list mutations (AniList, future services)
//! - [`IProgressSink`] - Live progress reporting to a UI or CLI

pub mod list_service;
pub mod progress_sink;

pub use list_service::{IListService, ListServiceError, SavedEntry};
pub use progress_sink::{IProgressSink, NoopProgressSink};
