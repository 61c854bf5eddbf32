//! Domain data types
//!
//! All timestamps are [`Timestamp`] (`DateTime<Utc>`). Stores convert to and
//! from their native representation at the boundary; nothing above the store
//! sees a string or epoch value.

pub mod credential;
pub mod outcome;
pub mod scheduler;

use chrono::{DateTime, Utc};

pub use credential::{AccessToken, CredentialRecord};
pub use outcome::{FailureKind, FetchReport, RunOutcome};
pub use scheduler::{HealthStatus, SchedulerState, Versioned};

/// Canonical internal timestamp.
pub type Timestamp = DateTime<Utc>;
