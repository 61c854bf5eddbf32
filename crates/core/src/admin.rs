//! Operator surface: inspection and manual overrides
//!
//! Mutations go through [`CircuitBreakerController::update`], so they use the
//! same conditional-write loop as scheduled ticks and cannot clobber a
//! concurrent outcome.

use std::sync::Arc;
use std::time::Duration;

use jobscout_common::resilience::CircuitState;
use jobscout_domain::{
    CredentialRecord, HealthStatus, JobScoutError, Result, SchedulerState, Timestamp, Versioned,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::auth::ports::CredentialStore;
use crate::scheduling::circuit;
use crate::scheduling::controller::CircuitBreakerController;

/// Point-in-time view of the scheduler state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub state: SchedulerState,
    pub version: u64,
    pub circuit: String,
    pub health: HealthReport,
}

/// Derived "is this healthy" summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub healthy: bool,
    pub summary: String,
}

impl HealthReport {
    fn from_state(state: &SchedulerState, threshold: u32, now: Timestamp) -> Self {
        let status = state.health(now);
        let summary = match status {
            HealthStatus::Running => match state.last_success {
                Some(at) => format!("Running normally; last success at {}", at.to_rfc3339()),
                None => "Running normally; no successful fetch yet".to_string(),
            },
            HealthStatus::Degraded => format!(
                "Running with {} consecutive failure(s) of {} allowed{}",
                state.consecutive_failures,
                threshold,
                last_error_suffix(state)
            ),
            HealthStatus::Disabled => format!("Manually disabled{}", last_error_suffix(state)),
            HealthStatus::CoolingDown => format!(
                "Circuit open after {} consecutive failures; cooling down until {}{}",
                state.consecutive_failures,
                state.circuit_open_until.map(|t| t.to_rfc3339()).unwrap_or_default(),
                last_error_suffix(state)
            ),
            HealthStatus::TrialPending => format!(
                "Circuit open; cooldown elapsed, next tick runs a trial attempt{}",
                last_error_suffix(state)
            ),
        };

        Self { status, healthy: status.is_healthy(), summary }
    }
}

fn last_error_suffix(state: &SchedulerState) -> String {
    state.last_error.as_deref().map(|e| format!("; last error: {e}")).unwrap_or_default()
}

/// Inspection and overrides consumed by the CLI
pub struct AdminService {
    controller: Arc<CircuitBreakerController>,
    credentials: Arc<dyn CredentialStore>,
    credential_id: String,
}

impl AdminService {
    pub fn new(
        controller: Arc<CircuitBreakerController>,
        credentials: Arc<dyn CredentialStore>,
        credential_id: impl Into<String>,
    ) -> Self {
        Self { controller, credentials, credential_id: credential_id.into() }
    }

    /// Current state with derived health
    ///
    /// # Errors
    /// `JobScoutError::NotFound` if the state was never initialized.
    pub async fn snapshot(&self) -> Result<StatusSnapshot> {
        let current = self.load_required().await?;
        let health = HealthReport::from_state(
            &current.value,
            self.controller.policy().failure_threshold,
            self.controller.now(),
        );
        Ok(StatusSnapshot {
            circuit: CircuitState::from(current.value.circuit_open).to_string(),
            state: current.value,
            version: current.version,
            health,
        })
    }

    /// Health summary only
    ///
    /// # Errors
    /// `JobScoutError::NotFound` if the state was never initialized.
    pub async fn health(&self) -> Result<HealthReport> {
        Ok(self.snapshot().await?.health)
    }

    /// Flip the manual kill switch
    #[instrument(skip(self))]
    pub async fn set_enabled(&self, enabled: bool) -> Result<SchedulerState> {
        self.controller
            .update(if enabled { "enable" } else { "disable" }, |state, now| {
                circuit::set_enabled(state, enabled, now)
            })
            .await
    }

    /// Re-enable and close the circuit, keeping `last_run`/`last_success`
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<SchedulerState> {
        self.controller.update("reset", circuit::reset).await
    }

    /// Create the state document with defaults if absent
    pub async fn initialize(&self) -> Result<bool> {
        self.controller.initialize().await
    }

    /// Seed the credential document from an out-of-band authorization
    ///
    /// # Errors
    /// `JobScoutError::InvalidInput` for empty tokens or a zero lifetime.
    #[instrument(skip(self, access_token, refresh_token))]
    pub async fn import_credentials(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_in: Duration,
    ) -> Result<CredentialRecord> {
        if access_token.trim().is_empty() || refresh_token.trim().is_empty() {
            return Err(JobScoutError::InvalidInput(
                "access and refresh tokens must not be empty".to_string(),
            ));
        }
        let lifetime = chrono::Duration::from_std(expires_in)
            .ok()
            .filter(|d| *d > chrono::Duration::zero())
            .ok_or_else(|| {
                JobScoutError::InvalidInput("expires_in must be a positive duration".to_string())
            })?;

        let now = self.controller.now();
        let expires_at = now.checked_add_signed(lifetime).ok_or_else(|| {
            JobScoutError::InvalidInput("expires_in is too large".to_string())
        })?;
        let record = CredentialRecord::new(access_token, refresh_token, expires_at, now);
        self.credentials.put(&self.credential_id, &record).await?;
        info!(credential_id = %self.credential_id, expires_at = %record.expires_at, "Credential imported");
        Ok(record)
    }

    async fn load_required(&self) -> Result<Versioned<SchedulerState>> {
        self.controller.load().await?.ok_or_else(|| {
            JobScoutError::NotFound(format!(
                "scheduler state '{}' (run `jobscout init`)",
                self.controller.state_id()
            ))
        })
    }
}
