//! Application context - dependency wiring

use std::path::PathBuf;
use std::sync::Arc;

use jobscout_common::resilience::{CircuitBreakerConfig, Clock, SystemClock};
use jobscout_core::{AdminService, CircuitBreakerController, SchedulerTrigger, TokenLifecycleManager};
use jobscout_domain::{Config, JobScoutError, Result};
use jobscout_infra::config;
use jobscout_infra::{
    DbManager, HttpFetchPipeline, OAuthAuthorizationProvider, SqliteCredentialStore,
    SqliteSchedulerStateStore,
};
use tracing::{debug, info};

/// Resolve configuration: an explicit path wins, otherwise environment with
/// file fallback.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => config::load_from_file(Some(path)),
        None => config::load(),
    }
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub trigger: Arc<SchedulerTrigger>,
    pub admin: AdminService,
}

impl AppContext {
    /// Open the database (applying the schema) and wire the services.
    ///
    /// # Errors
    /// Database, configuration or HTTP client construction failures.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;
        debug!(path = %db.path().display(), "Database ready");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let states = Arc::new(SqliteSchedulerStateStore::new(Arc::clone(&db)));
        let credentials = Arc::new(SqliteCredentialStore::new(Arc::clone(&db)));

        let policy = CircuitBreakerConfig::builder()
            .failure_threshold(config.scheduler.failure_threshold)
            .cooldown(config.scheduler.cooldown())
            .build()
            .map_err(|e| JobScoutError::Config(e.to_string()))?;

        let controller = Arc::new(CircuitBreakerController::new(
            config.scheduler.state_id.clone(),
            states,
            policy,
            Arc::clone(&clock),
        ));

        let tokens = Arc::new(TokenLifecycleManager::new(
            config.auth.credential_id.clone(),
            credentials.clone(),
            Arc::new(OAuthAuthorizationProvider::from_config(&config.auth)),
            Arc::clone(&clock),
            config.auth.refresh_skew(),
            config.auth.refresh_timeout(),
        ));

        let pipeline = Arc::new(HttpFetchPipeline::new(
            &config.marketplace,
            config.scheduler.pipeline_timeout(),
            Arc::clone(&clock),
        )?);

        let trigger = Arc::new(SchedulerTrigger::new(
            Arc::clone(&controller),
            tokens,
            pipeline,
            config.scheduler.pipeline_timeout(),
        ));
        let admin =
            AdminService::new(Arc::clone(&controller), credentials, config.auth.credential_id.clone());

        info!(
            state_id = %config.scheduler.state_id,
            credential_id = %config.auth.credential_id,
            "Application context initialized"
        );

        Ok(Self { config, db, trigger, admin })
    }
}
