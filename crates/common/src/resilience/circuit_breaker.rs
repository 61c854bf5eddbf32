//! Circuit breaker policy
//!
//! The breaker's *state* is persisted elsewhere; this module defines the
//! policy applied to it (threshold and cooldown) and the two observable
//! states. There is no persisted half-open state: the first tick after the
//! cooldown elapses is let through as a trial.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Simple configuration error for validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, allowing attempts
    Closed,
    /// Circuit is open, skipping attempts until the cooldown ends
    Open,
}

impl From<bool> for CircuitState {
    fn from(open: bool) -> Self {
        if open {
            Self::Open
        } else {
            Self::Closed
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
        }
    }
}

/// Longest accepted cooldown; keeps `now + cooldown` far from the calendar
/// limits
pub const MAX_COOLDOWN: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// How long an open circuit skips attempts before allowing a trial
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 3, cooldown: Duration::from_secs(6 * 60 * 60) }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid {
                message: "failure_threshold must be greater than 0".to_string(),
            });
        }

        if self.cooldown.is_zero() {
            return Err(ConfigError::Invalid {
                message: "cooldown must be greater than 0".to_string(),
            });
        }

        if self.cooldown > MAX_COOLDOWN {
            return Err(ConfigError::Invalid {
                message: format!(
                    "cooldown must not exceed {} seconds",
                    MAX_COOLDOWN.as_secs()
                ),
            });
        }

        Ok(())
    }

    /// Whether `consecutive_failures` has reached the threshold
    pub fn is_tripped(&self, consecutive_failures: u32) -> bool {
        consecutive_failures >= self.failure_threshold
    }

    /// Cooldown as a calendar duration for timestamp arithmetic
    ///
    /// Clamped to [`MAX_COOLDOWN`], which `validate` enforces up front.
    pub fn cooldown_span(&self) -> chrono::Duration {
        let cooldown = self.cooldown.min(MAX_COOLDOWN);
        chrono::Duration::from_std(cooldown).unwrap_or(chrono::Duration::MAX)
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self { config: CircuitBreakerConfig::default() }
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
