//! Shared fixtures for `jobscout-infra` integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use jobscout_common::auth::{OAuthClient, OAuthConfig};
use jobscout_common::resilience::{CircuitBreakerConfig, MockClock};
use jobscout_core::{
    AdminService, CircuitBreakerController, SchedulerStateStore, SchedulerTrigger,
    TokenLifecycleManager,
};
use jobscout_domain::{CredentialRecord, MarketplaceConfig, SchedulerState, Timestamp};
use jobscout_infra::database::{DbManager, SqliteCredentialStore, SqliteSchedulerStateStore};
use jobscout_infra::integrations::{HttpFetchPipeline, OAuthAuthorizationProvider};
use tempfile::TempDir;

pub const STATE_ID: &str = "default";
pub const CREDENTIAL_ID: &str = "marketplace";

pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

/// Temporary database that keeps the underlying file alive for the duration
/// of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager =
            DbManager::new(temp_dir.path().join("jobscout.db"), 4).expect("db manager created");
        manager.run_migrations().expect("migrations run");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Full wiring over SQLite, a real OAuth client and the HTTP pipeline.
pub struct Stack {
    pub db: TestDatabase,
    pub clock: MockClock,
    pub states: Arc<SqliteSchedulerStateStore>,
    pub credentials: Arc<SqliteCredentialStore>,
    pub controller: Arc<CircuitBreakerController>,
    pub trigger: SchedulerTrigger,
    pub admin: AdminService,
}

impl Stack {
    pub fn new(token_url: &str, marketplace_endpoint: &str) -> Self {
        let db = TestDatabase::new();
        let clock = MockClock::new(t0());
        let states = Arc::new(SqliteSchedulerStateStore::new(db.manager.clone()));
        let credentials = Arc::new(SqliteCredentialStore::new(db.manager.clone()));

        let policy = CircuitBreakerConfig::builder()
            .failure_threshold(3)
            .cooldown(Duration::from_secs(6 * 3600))
            .build()
            .unwrap();
        let controller = Arc::new(CircuitBreakerController::new(
            STATE_ID,
            states.clone(),
            policy,
            Arc::new(clock.clone()),
        ));

        let oauth = OAuthConfig::new(token_url.to_string(), "scout".to_string(), None)
            .with_request_timeout(Duration::from_secs(5));
        let tokens = Arc::new(TokenLifecycleManager::new(
            CREDENTIAL_ID,
            credentials.clone(),
            Arc::new(OAuthAuthorizationProvider::new(OAuthClient::new(oauth))),
            Arc::new(clock.clone()),
            Duration::from_secs(300),
            Duration::from_secs(5),
        ));

        let marketplace = MarketplaceConfig { endpoint: marketplace_endpoint.to_string() };
        let pipeline =
            HttpFetchPipeline::new(&marketplace, Duration::from_secs(5), Arc::new(clock.clone()))
                .expect("pipeline built");

        let trigger =
            SchedulerTrigger::new(controller.clone(), tokens, Arc::new(pipeline), Duration::from_secs(10));
        let admin = AdminService::new(controller.clone(), credentials.clone(), CREDENTIAL_ID);

        Self { db, clock, states, credentials, controller, trigger, admin }
    }

    pub async fn state(&self) -> SchedulerState {
        self.states.load(STATE_ID).await.unwrap().expect("state initialized").value
    }

    pub fn credential(&self, ttl: chrono::Duration) -> CredentialRecord {
        CredentialRecord::new("access-0", "refresh-0", t0() + ttl, t0())
    }
}
