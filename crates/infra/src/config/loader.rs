//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! Required:
//! - `JOBSCOUT_TOKEN_URL`: OAuth token endpoint
//! - `JOBSCOUT_CLIENT_ID`: OAuth client id
//! - `JOBSCOUT_MARKETPLACE_ENDPOINT`: Listings endpoint
//!
//! Optional (defaults in `jobscout_domain::constants`):
//! - `JOBSCOUT_CLIENT_SECRET`
//! - `JOBSCOUT_CREDENTIAL_ID`
//! - `JOBSCOUT_REFRESH_SKEW_SECONDS`, `JOBSCOUT_REFRESH_TIMEOUT_SECONDS`
//! - `JOBSCOUT_DB_PATH`, `JOBSCOUT_DB_POOL_SIZE`
//! - `JOBSCOUT_STATE_ID`, `JOBSCOUT_CRON`
//! - `JOBSCOUT_FAILURE_THRESHOLD`, `JOBSCOUT_COOLDOWN_SECONDS`,
//!   `JOBSCOUT_PIPELINE_TIMEOUT_SECONDS`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./jobscout.toml` or `./jobscout.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names one and two directories up
//! 4. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use jobscout_domain::constants::{
    DEFAULT_CREDENTIAL_ID, DEFAULT_REFRESH_SKEW_SECS, DEFAULT_REFRESH_TIMEOUT_SECS,
};
use jobscout_domain::{
    AuthConfig, Config, DatabaseConfig, JobScoutError, MarketplaceConfig, Result, SchedulerConfig,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["jobscout.toml", "jobscout.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `JobScoutError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Validation fails
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `JobScoutError::Config` if required variables are missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let defaults = SchedulerConfig::default();
    let database_defaults = DatabaseConfig::default();

    let config = Config {
        database: DatabaseConfig {
            path: env_opt("JOBSCOUT_DB_PATH").unwrap_or(database_defaults.path),
            pool_size: env_parse("JOBSCOUT_DB_POOL_SIZE", database_defaults.pool_size)?,
        },
        scheduler: SchedulerConfig {
            state_id: env_opt("JOBSCOUT_STATE_ID").unwrap_or(defaults.state_id),
            cron_expression: env_opt("JOBSCOUT_CRON").unwrap_or(defaults.cron_expression),
            failure_threshold: env_parse("JOBSCOUT_FAILURE_THRESHOLD", defaults.failure_threshold)?,
            cooldown_seconds: env_parse("JOBSCOUT_COOLDOWN_SECONDS", defaults.cooldown_seconds)?,
            pipeline_timeout_seconds: env_parse(
                "JOBSCOUT_PIPELINE_TIMEOUT_SECONDS",
                defaults.pipeline_timeout_seconds,
            )?,
        },
        auth: AuthConfig {
            credential_id: env_opt("JOBSCOUT_CREDENTIAL_ID")
                .unwrap_or_else(|| DEFAULT_CREDENTIAL_ID.to_string()),
            token_url: env_var("JOBSCOUT_TOKEN_URL")?,
            client_id: env_var("JOBSCOUT_CLIENT_ID")?,
            client_secret: env_opt("JOBSCOUT_CLIENT_SECRET"),
            refresh_skew_seconds: env_parse(
                "JOBSCOUT_REFRESH_SKEW_SECONDS",
                DEFAULT_REFRESH_SKEW_SECS,
            )?,
            refresh_timeout_seconds: env_parse(
                "JOBSCOUT_REFRESH_TIMEOUT_SECONDS",
                DEFAULT_REFRESH_TIMEOUT_SECS,
            )?,
        },
        marketplace: MarketplaceConfig { endpoint: env_var("JOBSCOUT_MARKETPLACE_ENDPOINT")? },
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `JobScoutError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Validation fails
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(JobScoutError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            JobScoutError::Config(
                "No configuration in environment and no config file found in any of the standard locations"
                    .to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| JobScoutError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| JobScoutError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| JobScoutError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(JobScoutError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        JobScoutError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable; empty values count as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional numeric environment variable
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| JobScoutError::Config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 14] = [
        "JOBSCOUT_TOKEN_URL",
        "JOBSCOUT_CLIENT_ID",
        "JOBSCOUT_CLIENT_SECRET",
        "JOBSCOUT_CREDENTIAL_ID",
        "JOBSCOUT_REFRESH_SKEW_SECONDS",
        "JOBSCOUT_REFRESH_TIMEOUT_SECONDS",
        "JOBSCOUT_MARKETPLACE_ENDPOINT",
        "JOBSCOUT_DB_PATH",
        "JOBSCOUT_DB_POOL_SIZE",
        "JOBSCOUT_STATE_ID",
        "JOBSCOUT_CRON",
        "JOBSCOUT_FAILURE_THRESHOLD",
        "JOBSCOUT_COOLDOWN_SECONDS",
        "JOBSCOUT_PIPELINE_TIMEOUT_SECONDS",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn set_required_env() {
        std::env::set_var("JOBSCOUT_TOKEN_URL", "https://auth.example.com/oauth/token");
        std::env::set_var("JOBSCOUT_CLIENT_ID", "client-123");
        std::env::set_var("JOBSCOUT_MARKETPLACE_ENDPOINT", "https://api.example.com/jobs");
    }

    fn write_temp(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_load_from_env_required_only_uses_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_env();
        set_required_env();

        let config = load_from_env().expect("config from env");

        assert_eq!(config.auth.client_id, "client-123");
        assert!(config.auth.client_secret.is_none());
        assert_eq!(config.auth.refresh_skew_seconds, 300);
        assert_eq!(config.scheduler.failure_threshold, 3);
        assert_eq!(config.scheduler.cooldown_seconds, 21_600);
        assert_eq!(config.scheduler.cron_expression, "0 0 * * * *");
        assert_eq!(config.database.path, "jobscout.db");

        clear_env();
    }

    #[test]
    fn test_load_from_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_env();
        set_required_env();
        std::env::set_var("JOBSCOUT_CLIENT_SECRET", "s3cret");
        std::env::set_var("JOBSCOUT_FAILURE_THRESHOLD", "5");
        std::env::set_var("JOBSCOUT_COOLDOWN_SECONDS", "3600");
        std::env::set_var("JOBSCOUT_DB_PATH", "/tmp/jobscout-test.db");
        std::env::set_var("JOBSCOUT_CRON", "0 */15 * * * *");

        let config = load_from_env().expect("config from env");

        assert_eq!(config.auth.client_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.scheduler.failure_threshold, 5);
        assert_eq!(config.scheduler.cooldown_seconds, 3600);
        assert_eq!(config.database.path, "/tmp/jobscout-test.db");
        assert_eq!(config.scheduler.cron_expression, "0 */15 * * * *");

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_env();
        std::env::set_var("JOBSCOUT_TOKEN_URL", "https://auth.example.com/oauth/token");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, JobScoutError::Config(ref msg) if msg.contains("JOBSCOUT_CLIENT_ID")));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_env();
        set_required_env();
        std::env::set_var("JOBSCOUT_DB_POOL_SIZE", "not-a-number");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, JobScoutError::Config(ref msg) if msg.contains("JOBSCOUT_DB_POOL_SIZE")));

        clear_env();
    }

    #[test]
    fn test_load_from_env_rejects_zero_threshold() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_env();
        set_required_env();
        std::env::set_var("JOBSCOUT_FAILURE_THRESHOLD", "0");

        assert!(matches!(load_from_env(), Err(JobScoutError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let path = write_temp(
            r#"
[database]
path = "toml.db"

[scheduler]
failure_threshold = 4
cooldown_seconds = 7200

[auth]
token_url = "https://auth.example.com/oauth/token"
client_id = "client-toml"
client_secret = "secret"

[marketplace]
endpoint = "https://api.example.com/jobs"
"#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).expect("config from toml");

        assert_eq!(config.database.path, "toml.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.scheduler.failure_threshold, 4);
        assert_eq!(config.scheduler.cooldown_seconds, 7200);
        assert_eq!(config.scheduler.state_id, "default");
        assert_eq!(config.auth.credential_id, "marketplace");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_json() {
        let path = write_temp(
            r#"{
                "auth": {
                    "token_url": "https://auth.example.com/oauth/token",
                    "client_id": "client-json",
                    "refresh_skew_seconds": 120
                },
                "marketplace": { "endpoint": "https://api.example.com/jobs" }
            }"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).expect("config from json");

        assert_eq!(config.auth.client_id, "client-json");
        assert_eq!(config.auth.refresh_skew_seconds, 120);
        assert_eq!(config.scheduler.pipeline_timeout_seconds, 300);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_missing_section() {
        let path = write_temp(r#"{ "database": { "path": "x.db" } }"#, "json");

        let err = load_from_file(Some(path.clone())).unwrap_err();
        assert!(matches!(err, JobScoutError::Config(ref msg) if msg.contains("Invalid JSON")));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/jobscout.toml")));
        assert!(matches!(result, Err(JobScoutError::Config(_))));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", Path::new("jobscout.yaml"));
        assert!(matches!(result, Err(JobScoutError::Config(ref msg)) if msg.contains("yaml")));
    }
}
