//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Circuit breaker defaults
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_COOLDOWN_SECS: u64 = 6 * 60 * 60;
pub const MAX_COOLDOWN_SECS: u64 = 30 * 24 * 60 * 60;

// Credential lifecycle defaults
pub const DEFAULT_REFRESH_SKEW_SECS: u64 = 5 * 60;
pub const MAX_REFRESH_SKEW_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 30;

// Fetch pipeline defaults
pub const DEFAULT_PIPELINE_TIMEOUT_SECS: u64 = 5 * 60;
pub const DEFAULT_CRON_EXPRESSION: &str = "0 0 * * * *"; // top of every hour

// Document identities
pub const DEFAULT_STATE_ID: &str = "default";
pub const DEFAULT_CREDENTIAL_ID: &str = "marketplace";

// Database defaults
pub const DEFAULT_DB_PATH: &str = "jobscout.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;

// Maximum length of a persisted `last_error` message
pub const MAX_LAST_ERROR_LENGTH: usize = 512;
