//! # JobScout Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the credential store, scheduler-state store,
//!   authorization provider and fetch pipeline
//! - `TokenLifecycleManager`: keeps the OAuth access token usable
//! - `CircuitBreakerController`: persisted gate around the fetch pipeline
//! - `SchedulerTrigger`: one guarded attempt per external tick
//! - `AdminService`: operator inspection and overrides
//!
//! ## Architecture Principles
//! - Only depends on `jobscout-common` and `jobscout-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod admin;
pub mod auth;
pub mod scheduling;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use admin::{AdminService, HealthReport, StatusSnapshot};
pub use auth::ports::{AuthorizationProvider, CredentialStore, ProviderError};
pub use auth::{AuthError, TokenLifecycleManager, TokenSource};
pub use scheduling::circuit::{GateDecision, SkipReason};
pub use scheduling::controller::{
    Admission, AttemptTicket, CircuitBreakerController, RecordResult,
};
pub use scheduling::ports::{FetchPipeline, PipelineError, SchedulerStateStore};
pub use scheduling::trigger::{SchedulerTrigger, TickReport};
