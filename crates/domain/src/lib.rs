//! # JobScout Domain
//!
//! Business domain types and models for JobScout.
//!
//! This crate contains:
//! - Persisted document types (`CredentialRecord`, `SchedulerState`)
//! - Run outcome and failure classification
//! - Domain error types and Result definitions
//! - Configuration structures and defaults
//!
//! ## Architecture
//! - No dependencies on other JobScout crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
