//! # JobScout Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - SQLite persistence for credentials and scheduler state
//! - The OAuth refresh adapter and the marketplace HTTP pipeline
//! - Configuration loading from environment and files
//! - The cron scheduler used by daemon mode
//!
//! ## Architecture
//! - Implements traits defined in `jobscout-core`
//! - Depends on `jobscout-domain`, `jobscout-common` and `jobscout-core`
//! - Contains all "impure" code (disk and network I/O)

pub mod config;
pub mod database;
pub mod errors;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use database::{DbManager, SqliteCredentialStore, SqliteSchedulerStateStore};
pub use errors::InfraError;
pub use integrations::{HttpFetchPipeline, OAuthAuthorizationProvider};
pub use scheduling::{FetchScheduler, FetchSchedulerConfig, SchedulerError, TickJob};
