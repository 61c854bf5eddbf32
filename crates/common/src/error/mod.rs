//! Error classification shared across JobScout crates
//!
//! Every fallible layer owns its own `thiserror` enum. What the layers share
//! is a way to *classify* those errors so callers can decide what to do with
//! them without matching on foreign variants:
//!
//! - **`is_retryable()`**: will the same operation plausibly succeed on the
//!   next attempt?
//! - **`severity()`**: how loudly should this be logged?
//! - **`is_critical()`**: does an operator have to act?
//! - **`retry_after()`**: a provider-suggested delay, when one is known
//!
//! ```rust
//! use std::time::Duration;
//!
//! use jobscout_common::error::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug)]
//! enum UploadError {
//!     Throttled,
//!     Forbidden,
//! }
//!
//! impl ErrorClassification for UploadError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Throttled)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Throttled => ErrorSeverity::Warning,
//!             Self::Forbidden => ErrorSeverity::Critical,
//!         }
//!     }
//!
//!     fn is_critical(&self) -> bool {
//!         self.severity() == ErrorSeverity::Critical
//!     }
//!
//!     fn retry_after(&self) -> Option<Duration> {
//!         None
//!     }
//! }
//!
//! assert!(UploadError::Throttled.is_retryable());
//! assert!(UploadError::Forbidden.is_critical());
//! ```

use std::fmt;
use std::time::Duration;

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as network timeouts, rate limiting or temporary service
    /// unavailability.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    ///
    /// Used for logging and alerting decisions.
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring operator attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    ///
    /// Returns `Some(Duration)` when the remote side advertised one (for
    /// example a `Retry-After` header), `None` otherwise.
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_urgency() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    #[test]
    fn severity_display_is_uppercase() {
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
    }
}
