//! Scheduler state document and derived health

use serde::{Deserialize, Serialize};

use super::Timestamp;
use crate::impl_domain_status_conversions;

/// Persisted circuit-breaker and kill-switch state.
///
/// Every field except `enabled` is owned by the circuit breaker controller.
/// `enabled` may also be written by an operator at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerState {
    pub enabled: bool,
    pub consecutive_failures: u32,
    pub circuit_open: bool,
    /// Meaningful only while `circuit_open` is true.
    pub circuit_open_until: Option<Timestamp>,
    pub last_run: Option<Timestamp>,
    pub last_success: Option<Timestamp>,
    pub last_error: Option<String>,
    pub updated_at: Timestamp,
}

impl SchedulerState {
    /// Fresh document: enabled, closed, never attempted.
    pub fn new(now: Timestamp) -> Self {
        Self {
            enabled: true,
            consecutive_failures: 0,
            circuit_open: false,
            circuit_open_until: None,
            last_run: None,
            last_success: None,
            last_error: None,
            updated_at: now,
        }
    }

    /// True while the circuit is open and its cooldown has not elapsed.
    pub fn is_cooling_down(&self, now: Timestamp) -> bool {
        match (self.circuit_open, self.circuit_open_until) {
            (true, Some(until)) => now < until,
            _ => false,
        }
    }

    /// Operator-facing classification. Manual disable takes priority.
    pub fn health(&self, now: Timestamp) -> HealthStatus {
        if !self.enabled {
            HealthStatus::Disabled
        } else if self.is_cooling_down(now) {
            HealthStatus::CoolingDown
        } else if self.circuit_open {
            HealthStatus::TrialPending
        } else if self.consecutive_failures > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Running
        }
    }
}

/// Summary of whether the scheduler is running normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Enabled, circuit closed, last attempt succeeded (or none yet).
    Running,
    /// Enabled and closed, but recent attempts failed.
    Degraded,
    /// Manual kill switch is off.
    Disabled,
    /// Circuit open; attempts skipped until the cooldown ends.
    CoolingDown,
    /// Circuit open with cooldown elapsed; the next tick is a trial attempt.
    TrialPending,
}

impl_domain_status_conversions!(HealthStatus {
    Running => "running",
    Degraded => "degraded",
    Disabled => "disabled",
    CoolingDown => "cooling_down",
    TrialPending => "trial_pending",
});

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// A stored document paired with its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }
}
