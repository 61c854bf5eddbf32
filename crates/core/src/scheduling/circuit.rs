//! Circuit breaker state transitions
//!
//! Pure functions over [`SchedulerState`]. The controller wraps them in
//! conditional writes; keeping them free of I/O lets every transition be
//! checked directly.

use jobscout_common::resilience::CircuitBreakerConfig;
use jobscout_domain::constants::MAX_LAST_ERROR_LENGTH;
use jobscout_domain::{JobScoutError, Result, RunOutcome, SchedulerState, Timestamp};
use serde::Serialize;

/// Verdict of the gate for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Run the pipeline. `trial` marks the first attempt after a cooldown.
    Proceed { trial: bool },
    Skip(SkipReason),
}

/// Why a tick did not run the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Manual kill switch is off
    Disabled,
    /// Circuit is open and the cooldown has not elapsed
    CoolingDown { until: Timestamp },
    /// No scheduler-state document exists yet
    Uninitialized,
    /// An overlapping tick claimed this attempt first
    ConcurrentAttempt,
}

/// Decide whether a tick at `now` may run.
///
/// Manual disable wins over everything. An open circuit without a deadline
/// is treated as already expired, so the next tick becomes a trial.
pub fn evaluate_gate(state: &SchedulerState, now: Timestamp) -> GateDecision {
    if !state.enabled {
        return GateDecision::Skip(SkipReason::Disabled);
    }

    if state.circuit_open {
        if let Some(until) = state.circuit_open_until {
            if now < until {
                return GateDecision::Skip(SkipReason::CoolingDown { until });
            }
        }
        return GateDecision::Proceed { trial: true };
    }

    GateDecision::Proceed { trial: false }
}

/// End of a cooldown that starts at `now`.
///
/// # Errors
/// `JobScoutError::Internal` when the deadline is past the end of the
/// calendar.
pub fn cooldown_deadline(policy: &CircuitBreakerConfig, now: Timestamp) -> Result<Timestamp> {
    now.checked_add_signed(policy.cooldown_span()).ok_or_else(|| {
        JobScoutError::Internal(format!("cooldown deadline after {now} is out of range"))
    })
}

/// Record that an attempt starts at `now`.
///
/// A trial claim also re-arms the cooldown from `now`. Ticks reading the
/// document after the claim see a closed gate until the trial's outcome is
/// recorded, so at most one trial runs per cooldown.
///
/// # Errors
/// See [`cooldown_deadline`].
pub fn mark_attempt(
    state: &SchedulerState,
    now: Timestamp,
    trial: bool,
    policy: &CircuitBreakerConfig,
) -> Result<SchedulerState> {
    let mut next = SchedulerState { last_run: Some(now), updated_at: now, ..state.clone() };
    if trial {
        next.circuit_open_until = Some(cooldown_deadline(policy, now)?);
    }
    Ok(next)
}

/// Fold an attempt's outcome into the state.
///
/// - Success clears every failure field and closes the circuit.
/// - Counted failures increment `consecutive_failures`; at or past the
///   threshold the circuit (re)opens with a fresh cooldown from `now`.
/// - Config failures only set `last_error`. If the counter already sits at
///   the threshold the cooldown is re-armed so an open circuit never carries
///   a deadline in the past.
/// - Auth rejections additionally turn the kill switch off.
///
/// # Errors
/// See [`cooldown_deadline`].
pub fn apply_outcome(
    state: &SchedulerState,
    outcome: &RunOutcome,
    policy: &CircuitBreakerConfig,
    now: Timestamp,
) -> Result<SchedulerState> {
    let mut next = state.clone();
    next.updated_at = now;

    match outcome {
        RunOutcome::Success => {
            next.consecutive_failures = 0;
            next.circuit_open = false;
            next.circuit_open_until = None;
            next.last_success = Some(now);
            next.last_error = None;
        }
        RunOutcome::Failure { kind, message } => {
            next.last_error = Some(truncate_message(message));

            if kind.counts_toward_threshold() {
                next.consecutive_failures = next.consecutive_failures.saturating_add(1);
            }
            if kind.disables_scheduler() {
                next.enabled = false;
            }
            if policy.is_tripped(next.consecutive_failures) {
                next.circuit_open = true;
                next.circuit_open_until = Some(cooldown_deadline(policy, now)?);
            }
        }
    }

    Ok(next)
}

/// Operator reset: re-enable and close the circuit, keeping run history.
pub fn reset(state: &SchedulerState, now: Timestamp) -> SchedulerState {
    SchedulerState {
        enabled: true,
        consecutive_failures: 0,
        circuit_open: false,
        circuit_open_until: None,
        last_error: None,
        updated_at: now,
        ..state.clone()
    }
}

/// Operator kill switch.
pub fn set_enabled(state: &SchedulerState, enabled: bool, now: Timestamp) -> SchedulerState {
    SchedulerState { enabled, updated_at: now, ..state.clone() }
}

fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_LAST_ERROR_LENGTH {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(MAX_LAST_ERROR_LENGTH - 3).collect();
    truncated.push_str("...");
    truncated
}
