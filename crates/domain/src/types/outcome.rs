//! Run outcome classification

use serde::{Deserialize, Serialize};

use super::Timestamp;
use crate::impl_domain_status_conversions;

/// Classification of a failed attempt, deciding how it is accounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network blip, rate limit, timeout. Counted, retried next tick.
    Transient,
    /// Refresh token rejected by the provider. Counted and disables the
    /// scheduler.
    AuthRejected,
    /// Missing credential document or configuration. Recorded in
    /// `last_error` only.
    Config,
    /// The fetch reported a domain-level failure. Counted like `Transient`.
    Pipeline,
}

impl_domain_status_conversions!(FailureKind {
    Transient => "transient",
    AuthRejected => "auth_rejected",
    Config => "config",
    Pipeline => "pipeline",
});

impl FailureKind {
    /// Whether this failure is evidence the dependency is unhealthy.
    pub fn counts_toward_threshold(self) -> bool {
        !matches!(self, Self::Config)
    }

    /// Whether this failure turns the kill switch off.
    pub fn disables_scheduler(self) -> bool {
        matches!(self, Self::AuthRejected)
    }
}

/// Result of one guarded attempt, as seen by the circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failure { kind: FailureKind, message: String },
}

impl RunOutcome {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure { kind, message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Summary returned by the fetch pipeline on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchReport {
    pub listings: usize,
    pub fetched_at: Timestamp,
}
