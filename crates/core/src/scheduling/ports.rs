//! Port interfaces for the scheduled fetch path
//!
//! These traits define the boundaries between the circuit breaker / trigger
//! and infrastructure implementations.

use std::time::Duration;

use async_trait::async_trait;
use jobscout_common::error::{ErrorClassification, ErrorSeverity};
use jobscout_domain::{AccessToken, FailureKind, FetchReport, Result, SchedulerState, Versioned};
use thiserror::Error;

/// Trait for persisting the scheduler-state document with optimistic
/// concurrency
#[async_trait]
pub trait SchedulerStateStore: Send + Sync {
    /// Load the document and its current version
    async fn load(&self, id: &str) -> Result<Option<Versioned<SchedulerState>>>;

    /// Insert `state` unless a document already exists.
    ///
    /// Returns the stored document and whether this call created it.
    async fn create_if_absent(
        &self,
        id: &str,
        state: &SchedulerState,
    ) -> Result<(Versioned<SchedulerState>, bool)>;

    /// Overwrite the document if its version is still `expected_version`.
    ///
    /// Returns the new version, or `None` when another writer got there first
    /// (or the document does not exist).
    async fn compare_and_swap(
        &self,
        id: &str,
        expected_version: u64,
        state: &SchedulerState,
    ) -> Result<Option<u64>>;
}

/// Failure reported by the fetch pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Network failure, throttling or server error
    #[error("marketplace transport failure: {0}")]
    Transport(String),

    /// The response could not be interpreted
    #[error("malformed marketplace response: {0}")]
    Malformed(String),

    /// The marketplace refused the request
    #[error("marketplace rejected the request: {0}")]
    Upstream(String),
}

impl PipelineError {
    /// How the circuit breaker accounts for this failure
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) => FailureKind::Transient,
            Self::Malformed(_) | Self::Upstream(_) => FailureKind::Pipeline,
        }
    }
}

impl ErrorClassification for PipelineError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Transport(_) => ErrorSeverity::Warning,
            Self::Malformed(_) | Self::Upstream(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// The marketplace query, treated as a black box
#[async_trait]
pub trait FetchPipeline: Send + Sync {
    /// Run one fetch with the supplied bearer token
    async fn run(&self, token: &AccessToken) -> std::result::Result<FetchReport, PipelineError>;
}
