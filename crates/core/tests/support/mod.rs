//! Shared fixtures for `jobscout-core` integration tests.
//!
//! `Harness` wires the controller, token manager and trigger over the
//! in-memory stores with a shared `MockClock`, so each test only scripts the
//! provider and pipeline responses it cares about.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use jobscout_common::resilience::{CircuitBreakerConfig, MockClock};
use jobscout_core::testing::{
    InMemoryCredentialStore, InMemorySchedulerStateStore, ScriptedPipeline, ScriptedProvider,
};
use jobscout_core::{AdminService, CircuitBreakerController, SchedulerTrigger, TokenLifecycleManager};
use jobscout_domain::{CredentialRecord, FetchReport, SchedulerState, Timestamp};

pub const STATE_ID: &str = "default";
pub const CREDENTIAL_ID: &str = "marketplace";
pub const REFRESH_SKEW: Duration = Duration::from_secs(300);
pub const REFRESH_TIMEOUT: Duration = Duration::from_secs(30);
pub const PIPELINE_TIMEOUT: Duration = Duration::from_secs(300);

/// Fixed starting instant for every scenario
pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

pub fn policy() -> CircuitBreakerConfig {
    CircuitBreakerConfig::builder()
        .failure_threshold(3)
        .cooldown(Duration::from_secs(6 * 3600))
        .build()
        .unwrap()
}

/// Credential expiring `ttl` after `now`
pub fn credential(now: Timestamp, ttl: chrono::Duration) -> CredentialRecord {
    CredentialRecord::new("access-0", "refresh-0", now + ttl, now)
}

pub fn report(listings: usize) -> FetchReport {
    FetchReport { listings, fetched_at: t0() }
}

pub struct Harness {
    pub clock: MockClock,
    pub states: Arc<InMemorySchedulerStateStore>,
    pub credentials: Arc<InMemoryCredentialStore>,
    pub provider: Arc<ScriptedProvider>,
    pub pipeline: Arc<ScriptedPipeline>,
    pub controller: Arc<CircuitBreakerController>,
    pub tokens: Arc<TokenLifecycleManager>,
    pub trigger: SchedulerTrigger,
    pub admin: AdminService,
}

impl Harness {
    /// Initialized state and a credential valid for thirty days
    pub async fn new() -> Self {
        let harness = Self::bare(PIPELINE_TIMEOUT);
        harness.admin.initialize().await.unwrap();
        harness.credentials.overwrite(CREDENTIAL_ID, credential(t0(), chrono::Duration::days(30)));
        harness
    }

    /// Nothing stored yet
    pub fn bare(pipeline_timeout: Duration) -> Self {
        let clock = MockClock::new(t0());
        let states = Arc::new(InMemorySchedulerStateStore::new());
        let credentials = Arc::new(InMemoryCredentialStore::new());
        let provider = Arc::new(ScriptedProvider::new());
        let pipeline = Arc::new(ScriptedPipeline::new());

        let controller = Arc::new(CircuitBreakerController::new(
            STATE_ID,
            states.clone(),
            policy(),
            Arc::new(clock.clone()),
        ));
        let tokens = Arc::new(TokenLifecycleManager::new(
            CREDENTIAL_ID,
            credentials.clone(),
            provider.clone(),
            Arc::new(clock.clone()),
            REFRESH_SKEW,
            REFRESH_TIMEOUT,
        ));
        let trigger = SchedulerTrigger::new(
            controller.clone(),
            tokens.clone(),
            pipeline.clone(),
            pipeline_timeout,
        );
        let admin = AdminService::new(controller.clone(), credentials.clone(), CREDENTIAL_ID);

        Self { clock, states, credentials, provider, pipeline, controller, tokens, trigger, admin }
    }

    pub fn state(&self) -> SchedulerState {
        self.states.get(STATE_ID).unwrap().value
    }
}
