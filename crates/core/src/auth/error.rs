//! Credential lifecycle errors

use std::time::Duration;

use jobscout_common::error::{ErrorClassification, ErrorSeverity};
use jobscout_domain::{FailureKind, JobScoutError};
use thiserror::Error;

/// Error returned when a usable access token cannot be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Provider refused the stored refresh token. Needs re-authorization.
    #[error("refresh token rejected: {0}")]
    RefreshRejected(String),

    #[error("token refresh failed: {0}")]
    Transient(String),

    #[error("token refresh timed out after {0:?}")]
    Timeout(Duration),

    /// No credential document (or an empty refresh token) for this identity
    #[error("no usable credential stored for '{0}'")]
    MissingCredential(String),

    /// The provider issued a token that expires within the refresh skew
    #[error("refreshed token lives {lifetime_secs}s, not beyond the {skew_secs}s refresh skew")]
    InsufficientLifetime { lifetime_secs: i64, skew_secs: i64 },

    #[error("credential store error: {0}")]
    Store(#[from] JobScoutError),
}

impl AuthError {
    /// How the circuit breaker accounts for this failure
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::RefreshRejected(_) => FailureKind::AuthRejected,
            Self::Transient(_) | Self::Timeout(_) | Self::Store(_) => FailureKind::Transient,
            Self::MissingCredential(_) | Self::InsufficientLifetime { .. } => FailureKind::Config,
        }
    }
}

impl ErrorClassification for AuthError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Timeout(_) | Self::Store(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RefreshRejected(_) => ErrorSeverity::Critical,
            Self::Transient(_) | Self::Timeout(_) => ErrorSeverity::Warning,
            Self::MissingCredential(_) | Self::InsufficientLifetime { .. } | Self::Store(_) => {
                ErrorSeverity::Error
            }
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::RefreshRejected(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
