//! listsync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `SyncEntry`, `SyncProgress`, `SyncReport`, `RateLimitState`
//! - **Port definitions** - Traits for adapters: `IListService`, `IProgressSink`
//! - **Configuration** - YAML-backed settings shared by the engine and the CLI
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure data types with no I/O.
//! Ports define trait interfaces that adapter crates implement.

pub mod config;
pub mod domain;
pub mod ports;
