//! Persisted circuit breaker controller
//!
//! Every mutation is a read, a pure transition from [`super::circuit`], and a
//! conditional write keyed on the version that was read. A writer that loses
//! the race re-reads and decides again; it never overwrites blindly.

use std::sync::Arc;

use chrono::SubsecRound;
use jobscout_common::resilience::{CircuitBreakerConfig, CircuitState, Clock};
use jobscout_domain::{JobScoutError, Result, RunOutcome, SchedulerState, Timestamp, Versioned};
use tracing::{debug, error, info, instrument, warn};

use super::circuit::{self, GateDecision, SkipReason};
use super::ports::SchedulerStateStore;

/// Upper bound on read/compare-and-swap rounds for one mutation
const MAX_CAS_ATTEMPTS: usize = 5;

/// Result of asking the gate for permission to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted(AttemptTicket),
    Skipped(SkipReason),
}

/// Proof that this caller claimed an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptTicket {
    /// When the attempt was claimed (the persisted `last_run`)
    pub started_at: Timestamp,
    /// Document version written by the claim
    pub version: u64,
    /// First attempt after a cooldown
    pub trial: bool,
}

/// What happened to a recorded outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordResult {
    /// The outcome was folded into the persisted state
    Applied(SchedulerState),
    /// A concurrent success made this failure moot; state left as found
    Superseded(SchedulerState),
}

/// Gate and outcome recorder backed by a versioned store
pub struct CircuitBreakerController {
    state_id: String,
    store: Arc<dyn SchedulerStateStore>,
    policy: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
}

impl CircuitBreakerController {
    pub fn new(
        state_id: impl Into<String>,
        store: Arc<dyn SchedulerStateStore>,
        policy: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { state_id: state_id.into(), store, policy, clock }
    }

    pub fn state_id(&self) -> &str {
        &self.state_id
    }

    pub fn policy(&self) -> &CircuitBreakerConfig {
        &self.policy
    }

    /// Current time at the millisecond precision the stores persist, so
    /// timestamps read back compare equal to the ones written.
    pub fn now(&self) -> Timestamp {
        self.clock.now().trunc_subsecs(3)
    }

    /// Current document, if initialized
    pub async fn load(&self) -> Result<Option<Versioned<SchedulerState>>> {
        self.store.load(&self.state_id).await
    }

    /// Create the document with defaults unless it exists.
    ///
    /// Returns `true` when this call created it.
    #[instrument(skip(self), fields(state_id = %self.state_id))]
    pub async fn initialize(&self) -> Result<bool> {
        let defaults = SchedulerState::new(self.now());
        let (_, created) = self.store.create_if_absent(&self.state_id, &defaults).await?;
        if created {
            info!("Scheduler state initialized");
        } else {
            debug!("Scheduler state already present");
        }
        Ok(created)
    }

    /// Evaluate the gate and, if open, claim the attempt by persisting
    /// `last_run`. A trial claim also re-arms the cooldown, so overlapping
    /// ticks cannot both run the trial.
    ///
    /// When the claim loses a race, the fresh document decides: if another
    /// invocation already stamped `last_run`, this one backs off; otherwise
    /// (an operator toggle, a late outcome) the gate is evaluated again.
    ///
    /// # Errors
    /// Store failures, or `JobScoutError::Conflict` if the document keeps
    /// changing underneath.
    #[instrument(skip(self), fields(state_id = %self.state_id))]
    pub async fn begin_attempt(&self) -> Result<Admission> {
        let Some(mut current) = self.store.load(&self.state_id).await? else {
            warn!("Scheduler state missing; run initialize first");
            return Ok(Admission::Skipped(SkipReason::Uninitialized));
        };

        for _ in 0..MAX_CAS_ATTEMPTS {
            let now = self.now();
            let trial = match circuit::evaluate_gate(&current.value, now) {
                GateDecision::Skip(reason) => {
                    debug!(?reason, "Gate closed; skipping attempt");
                    return Ok(Admission::Skipped(reason));
                }
                GateDecision::Proceed { trial } => trial,
            };

            let claimed = circuit::mark_attempt(&current.value, now, trial, &self.policy)?;
            if let Some(version) =
                self.store.compare_and_swap(&self.state_id, current.version, &claimed).await?
            {
                if trial {
                    info!(
                        consecutive_failures = current.value.consecutive_failures,
                        "Cooldown elapsed; running trial attempt"
                    );
                }
                return Ok(Admission::Admitted(AttemptTicket { started_at: now, version, trial }));
            }

            let Some(fresh) = self.store.load(&self.state_id).await? else {
                return Ok(Admission::Skipped(SkipReason::Uninitialized));
            };
            if fresh.value.last_run != current.value.last_run {
                info!("Another invocation claimed this attempt");
                return Ok(Admission::Skipped(SkipReason::ConcurrentAttempt));
            }
            debug!(version = fresh.version, "State changed before claim; re-evaluating gate");
            current = fresh;
        }

        Err(self.exhausted("claim attempt"))
    }

    /// Persist the outcome of an attempt claimed with `ticket`.
    ///
    /// A failure is discarded when the document shows a success recorded at
    /// or after this attempt started. `enabled` is always taken from the
    /// freshly read document, so an operator toggle made mid-run survives.
    ///
    /// # Errors
    /// Store failures, `JobScoutError::NotFound` if the document vanished, or
    /// `JobScoutError::Conflict` after repeated lost races.
    #[instrument(skip(self, ticket), fields(state_id = %self.state_id, trial = ticket.trial))]
    pub async fn record_outcome(
        &self,
        ticket: &AttemptTicket,
        outcome: &RunOutcome,
    ) -> Result<RecordResult> {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.load_required().await?;

            if current.version != ticket.version && Self::is_superseded(&current.value, ticket, outcome) {
                info!("Concurrent success already recorded; discarding failure");
                return Ok(RecordResult::Superseded(current.value));
            }

            let next = circuit::apply_outcome(&current.value, outcome, &self.policy, self.now())?;

            if self.store.compare_and_swap(&self.state_id, current.version, &next).await?.is_some() {
                self.log_transition(&current.value, &next, outcome);
                return Ok(RecordResult::Applied(next));
            }
            debug!("Outcome write lost a race; re-reading");
        }

        Err(self.exhausted("record outcome"))
    }

    /// Apply an operator mutation with the same conditional-write loop.
    pub async fn update<F>(&self, operation: &str, mutate: F) -> Result<SchedulerState>
    where
        F: Fn(&SchedulerState, Timestamp) -> SchedulerState + Send + Sync,
    {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let current = self.load_required().await?;
            let next = mutate(&current.value, self.now());
            if self.store.compare_and_swap(&self.state_id, current.version, &next).await?.is_some() {
                info!(operation, enabled = next.enabled, "Scheduler state updated");
                return Ok(next);
            }
        }
        Err(self.exhausted(operation))
    }

    fn is_superseded(current: &SchedulerState, ticket: &AttemptTicket, outcome: &RunOutcome) -> bool {
        !outcome.is_success()
            && current.last_success.is_some_and(|success| success >= ticket.started_at)
    }

    async fn load_required(&self) -> Result<Versioned<SchedulerState>> {
        self.store.load(&self.state_id).await?.ok_or_else(|| {
            JobScoutError::NotFound(format!("scheduler state '{}'", self.state_id))
        })
    }

    fn exhausted(&self, operation: &str) -> JobScoutError {
        error!(operation, attempts = MAX_CAS_ATTEMPTS, "Gave up after repeated write conflicts");
        JobScoutError::Conflict(format!(
            "{operation} on scheduler state '{}' lost {MAX_CAS_ATTEMPTS} consecutive races",
            self.state_id
        ))
    }

    fn log_transition(&self, before: &SchedulerState, after: &SchedulerState, outcome: &RunOutcome) {
        let from = CircuitState::from(before.circuit_open);
        let to = CircuitState::from(after.circuit_open);

        if before.enabled && !after.enabled {
            error!(
                last_error = after.last_error.as_deref().unwrap_or_default(),
                "Scheduler disabled; operator re-authorization required"
            );
        }

        match (from, to) {
            (CircuitState::Closed, CircuitState::Open) => warn!(
                consecutive_failures = after.consecutive_failures,
                circuit_open_until = ?after.circuit_open_until,
                "Circuit opened"
            ),
            (CircuitState::Open, CircuitState::Closed) => info!("Circuit closed after successful trial"),
            (CircuitState::Open, CircuitState::Open) => warn!(
                consecutive_failures = after.consecutive_failures,
                circuit_open_until = ?after.circuit_open_until,
                "Trial failed; cooldown extended"
            ),
            (CircuitState::Closed, CircuitState::Closed) => match outcome {
                RunOutcome::Success => debug!("Attempt succeeded"),
                RunOutcome::Failure { kind, .. } => warn!(
                    %kind,
                    consecutive_failures = after.consecutive_failures,
                    threshold = self.policy.failure_threshold,
                    "Attempt failed"
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use jobscout_common::resilience::MockClock;
    use jobscout_domain::FailureKind;

    use super::*;
    use crate::testing::InMemorySchedulerStateStore;

    fn setup() -> (CircuitBreakerController, Arc<InMemorySchedulerStateStore>, MockClock) {
        let clock = MockClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let store = Arc::new(InMemorySchedulerStateStore::new());
        let controller = CircuitBreakerController::new(
            "default",
            store.clone(),
            CircuitBreakerConfig::default(),
            Arc::new(clock.clone()),
        );
        (controller, store, clock)
    }

    #[tokio::test]
    async fn begin_attempt_without_document_skips() {
        let (controller, _, _) = setup();
        assert_eq!(
            controller.begin_attempt().await.unwrap(),
            Admission::Skipped(SkipReason::Uninitialized)
        );
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let (controller, store, _) = setup();
        assert!(controller.initialize().await.unwrap());
        assert!(!controller.initialize().await.unwrap());
        assert_eq!(store.get("default").unwrap().version, 1);
    }

    #[tokio::test]
    async fn claim_loses_to_concurrent_claim() {
        let (controller, store, clock) = setup();
        controller.initialize().await.unwrap();

        let rival = clock.now() - chrono::Duration::seconds(1);
        store.before_next_swap(move |state| state.last_run = Some(rival));

        assert_eq!(
            controller.begin_attempt().await.unwrap(),
            Admission::Skipped(SkipReason::ConcurrentAttempt)
        );
    }

    #[tokio::test]
    async fn claim_rechecks_operator_disable() {
        let (controller, store, _) = setup();
        controller.initialize().await.unwrap();

        store.before_next_swap(|state| state.enabled = false);

        assert_eq!(
            controller.begin_attempt().await.unwrap(),
            Admission::Skipped(SkipReason::Disabled)
        );
        assert!(store.get("default").unwrap().value.last_run.is_none());
    }

    #[tokio::test]
    async fn failure_superseded_by_concurrent_success_is_discarded() {
        let (controller, store, clock) = setup();
        controller.initialize().await.unwrap();
        let Admission::Admitted(ticket) = controller.begin_attempt().await.unwrap() else {
            panic!("expected admission");
        };

        clock.advance_secs(10);
        let winner_success = clock.now();
        let stored = store.get("default").unwrap();
        let mut won = stored.value.clone();
        won.last_success = Some(winner_success);
        store.compare_and_swap("default", stored.version, &won).await.unwrap();

        let result = controller
            .record_outcome(&ticket, &RunOutcome::failure(FailureKind::Transient, "late"))
            .await
            .unwrap();

        assert!(matches!(result, RecordResult::Superseded(_)));
        let after = store.get("default").unwrap().value;
        assert_eq!(after.consecutive_failures, 0);
        assert!(after.last_error.is_none());
    }

    #[tokio::test]
    async fn outcome_keeps_operator_disable_made_mid_run() {
        let (controller, store, _) = setup();
        controller.initialize().await.unwrap();
        let Admission::Admitted(ticket) = controller.begin_attempt().await.unwrap() else {
            panic!("expected admission");
        };

        store.before_next_swap(|state| state.enabled = false);

        let result = controller.record_outcome(&ticket, &RunOutcome::Success).await.unwrap();
        let RecordResult::Applied(state) = result else { panic!("expected applied") };
        assert!(!state.enabled);
        assert!(state.last_success.is_some());
    }

    #[tokio::test]
    async fn success_in_same_millisecond_supersedes_failure() {
        let clock = MockClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        clock.advance(chrono::Duration::nanoseconds(1_234_567));
        let store = Arc::new(InMemorySchedulerStateStore::new());
        let controller = CircuitBreakerController::new(
            "default",
            store.clone(),
            CircuitBreakerConfig::default(),
            Arc::new(clock.clone()),
        );
        controller.initialize().await.unwrap();

        let Admission::Admitted(ticket) = controller.begin_attempt().await.unwrap() else {
            panic!("expected admission");
        };
        assert_eq!(ticket.started_at.timestamp_subsec_nanos(), 1_000_000);

        // Rival success lands in the same millisecond, stored at ms precision
        clock.advance(chrono::Duration::nanoseconds(500_000));
        let stored = store.get("default").unwrap();
        let mut won = stored.value.clone();
        won.last_success = Some(clock.now().trunc_subsecs(3));
        store.compare_and_swap("default", stored.version, &won).await.unwrap();

        let result = controller
            .record_outcome(&ticket, &RunOutcome::failure(FailureKind::Transient, "late"))
            .await
            .unwrap();
        assert!(matches!(result, RecordResult::Superseded(_)));
    }

    #[tokio::test]
    async fn record_without_document_is_not_found() {
        let (controller, _, clock) = setup();
        let ticket = AttemptTicket { started_at: clock.now(), version: 1, trial: false };
        let err = controller.record_outcome(&ticket, &RunOutcome::Success).await.unwrap_err();
        assert!(matches!(err, JobScoutError::NotFound(_)));
    }
}
