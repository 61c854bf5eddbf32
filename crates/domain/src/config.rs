//! Application configuration structures
//!
//! Loading lives in `jobscout-infra::config`; this module only defines the
//! shape, defaults and validation rules.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COOLDOWN_SECS, DEFAULT_CREDENTIAL_ID, DEFAULT_CRON_EXPRESSION, DEFAULT_DB_PATH,
    DEFAULT_DB_POOL_SIZE, DEFAULT_FAILURE_THRESHOLD, DEFAULT_PIPELINE_TIMEOUT_SECS,
    DEFAULT_REFRESH_SKEW_SECS, DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_STATE_ID, MAX_COOLDOWN_SECS,
    MAX_REFRESH_SKEW_SECS,
};
use crate::{JobScoutError, Result};

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    pub auth: AuthConfig,
    pub marketplace: MarketplaceConfig,
}

impl Config {
    /// Check value ranges and required fields.
    ///
    /// # Errors
    /// Returns `JobScoutError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(JobScoutError::Config("database.path must not be empty".into()));
        }
        if self.database.pool_size == 0 {
            return Err(JobScoutError::Config("database.pool_size must be > 0".into()));
        }
        if self.scheduler.failure_threshold == 0 {
            return Err(JobScoutError::Config("scheduler.failure_threshold must be > 0".into()));
        }
        if self.scheduler.cooldown_seconds == 0 {
            return Err(JobScoutError::Config("scheduler.cooldown_seconds must be > 0".into()));
        }
        if self.scheduler.cooldown_seconds > MAX_COOLDOWN_SECS {
            return Err(JobScoutError::Config(format!(
                "scheduler.cooldown_seconds must be <= {MAX_COOLDOWN_SECS}"
            )));
        }
        if self.scheduler.pipeline_timeout_seconds == 0 {
            return Err(JobScoutError::Config(
                "scheduler.pipeline_timeout_seconds must be > 0".into(),
            ));
        }
        if self.scheduler.state_id.trim().is_empty() {
            return Err(JobScoutError::Config("scheduler.state_id must not be empty".into()));
        }
        if self.auth.credential_id.trim().is_empty() {
            return Err(JobScoutError::Config("auth.credential_id must not be empty".into()));
        }
        if self.auth.token_url.trim().is_empty() {
            return Err(JobScoutError::Config("auth.token_url must not be empty".into()));
        }
        if self.auth.client_id.trim().is_empty() {
            return Err(JobScoutError::Config("auth.client_id must not be empty".into()));
        }
        if self.auth.refresh_skew_seconds > MAX_REFRESH_SKEW_SECS {
            return Err(JobScoutError::Config(format!(
                "auth.refresh_skew_seconds must be <= {MAX_REFRESH_SKEW_SECS}"
            )));
        }
        if self.auth.refresh_timeout_seconds == 0 {
            return Err(JobScoutError::Config("auth.refresh_timeout_seconds must be > 0".into()));
        }
        if self.marketplace.endpoint.trim().is_empty() {
            return Err(JobScoutError::Config("marketplace.endpoint must not be empty".into()));
        }
        Ok(())
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path(), pool_size: default_pool_size() }
    }
}

/// Circuit breaker and cadence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_state_id")]
    pub state_id: String,
    #[serde(default = "default_cron_expression")]
    pub cron_expression: String,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,
    #[serde(default = "default_pipeline_timeout_seconds")]
    pub pipeline_timeout_seconds: u64,
}

impl SchedulerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_seconds)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            state_id: default_state_id(),
            cron_expression: default_cron_expression(),
            failure_threshold: default_failure_threshold(),
            cooldown_seconds: default_cooldown_seconds(),
            pipeline_timeout_seconds: default_pipeline_timeout_seconds(),
        }
    }
}

/// OAuth credential configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_credential_id")]
    pub credential_id: String,
    pub token_url: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_refresh_skew_seconds")]
    pub refresh_skew_seconds: u64,
    #[serde(default = "default_refresh_timeout_seconds")]
    pub refresh_timeout_seconds: u64,
}

impl AuthConfig {
    pub fn refresh_skew(&self) -> Duration {
        Duration::from_secs(self.refresh_skew_seconds)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.refresh_timeout_seconds)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("credential_id", &self.credential_id)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_skew_seconds", &self.refresh_skew_seconds)
            .field("refresh_timeout_seconds", &self.refresh_timeout_seconds)
            .finish()
    }
}

/// Marketplace fetch endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    pub endpoint: String,
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}

fn default_state_id() -> String {
    DEFAULT_STATE_ID.to_string()
}

fn default_cron_expression() -> String {
    DEFAULT_CRON_EXPRESSION.to_string()
}

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

fn default_cooldown_seconds() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

fn default_pipeline_timeout_seconds() -> u64 {
    DEFAULT_PIPELINE_TIMEOUT_SECS
}

fn default_credential_id() -> String {
    DEFAULT_CREDENTIAL_ID.to_string()
}

fn default_refresh_skew_seconds() -> u64 {
    DEFAULT_REFRESH_SKEW_SECS
}

fn default_refresh_timeout_seconds() -> u64 {
    DEFAULT_REFRESH_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "auth": { "token_url": "https://auth.example.com/token", "client_id": "scout" },
            "marketplace": { "endpoint": "https://api.example.com/jobs" }
        }"#
    }

    #[test]
    fn missing_sections_take_defaults() {
        let config: Config = serde_json::from_str(minimal_json()).unwrap();

        assert_eq!(config.database.path, "jobscout.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.scheduler.failure_threshold, 3);
        assert_eq!(config.scheduler.cooldown(), Duration::from_secs(6 * 3600));
        assert_eq!(config.scheduler.pipeline_timeout(), Duration::from_secs(300));
        assert_eq!(config.scheduler.cron_expression, "0 0 * * * *");
        assert_eq!(config.auth.credential_id, "marketplace");
        assert_eq!(config.auth.refresh_skew(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let mut config: Config = serde_json::from_str(minimal_json()).unwrap();
        config.scheduler.failure_threshold = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, JobScoutError::Config(ref msg) if msg.contains("failure_threshold")));
    }

    #[test]
    fn oversized_cooldown_and_skew_are_rejected() {
        let mut config: Config = serde_json::from_str(minimal_json()).unwrap();
        config.scheduler.cooldown_seconds = 100_000_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, JobScoutError::Config(ref msg) if msg.contains("cooldown_seconds")));

        config.scheduler.cooldown_seconds = MAX_COOLDOWN_SECS;
        config.auth.refresh_skew_seconds = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, JobScoutError::Config(ref msg) if msg.contains("refresh_skew_seconds")));

        config.auth.refresh_skew_seconds = MAX_REFRESH_SKEW_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_token_url_is_rejected() {
        let mut config: Config = serde_json::from_str(minimal_json()).unwrap();
        config.auth.token_url = "  ".into();

        assert!(matches!(config.validate(), Err(JobScoutError::Config(_))));
    }

    #[test]
    fn debug_redacts_client_secret() {
        let mut config: Config = serde_json::from_str(minimal_json()).unwrap();
        config.auth.client_secret = Some("hunter2".into());

        let rendered = format!("{:?}", config.auth);
        assert!(!rendered.contains("hunter2"));
    }
}
