//! Resilience building blocks
//!
//! - **Circuit breaker policy**: failure threshold and cooldown applied to a
//!   persisted breaker state
//! - **Clock**: wall-clock abstraction so cooldown and expiry arithmetic can be
//!   driven deterministically in tests

pub mod circuit_breaker;
pub mod clock;

pub use circuit_breaker::{
    CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitState, ConfigError, ConfigResult,
    MAX_COOLDOWN,
};
pub use clock::{Clock, MockClock, SystemClock};
