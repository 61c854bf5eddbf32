//! Scheduler trigger - one guarded fetch attempt per external tick
//!
//! Composes the gate, the token lifecycle and the fetch pipeline. Every
//! failure is converted into a [`RunOutcome`] here; `tick` itself never
//! returns an error.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use jobscout_common::error::{ErrorClassification, ErrorSeverity};
use jobscout_domain::{FailureKind, FetchReport, RunOutcome, SchedulerState};
use serde::Serialize;
use tracing::{error, info, instrument, warn, Level};

use super::circuit::SkipReason;
use super::controller::{Admission, CircuitBreakerController, RecordResult};
use super::ports::FetchPipeline;
use crate::auth::TokenSource;

/// What one tick did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickReport {
    /// The gate refused the attempt; nothing was mutated
    Skipped { reason: SkipReason },
    /// The pipeline was attempted and the outcome recorded (or superseded)
    Completed {
        trial: bool,
        outcome: RunOutcome,
        superseded: bool,
        report: Option<FetchReport>,
        state: SchedulerState,
    },
    /// The state store itself failed
    Errored { message: String },
}

impl TickReport {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { outcome: RunOutcome::Success, .. })
    }
}

/// Entry point fired by the external scheduler
pub struct SchedulerTrigger {
    controller: Arc<CircuitBreakerController>,
    tokens: Arc<dyn TokenSource>,
    pipeline: Arc<dyn FetchPipeline>,
    pipeline_timeout: Duration,
}

impl SchedulerTrigger {
    pub fn new(
        controller: Arc<CircuitBreakerController>,
        tokens: Arc<dyn TokenSource>,
        pipeline: Arc<dyn FetchPipeline>,
        pipeline_timeout: Duration,
    ) -> Self {
        Self { controller, tokens, pipeline, pipeline_timeout }
    }

    pub fn controller(&self) -> &Arc<CircuitBreakerController> {
        &self.controller
    }

    /// Run one guarded attempt
    #[instrument(skip(self), fields(state_id = %self.controller.state_id()))]
    pub async fn tick(&self) -> TickReport {
        let ticket = match self.controller.begin_attempt().await {
            Ok(Admission::Admitted(ticket)) => ticket,
            Ok(Admission::Skipped(reason)) => return TickReport::Skipped { reason },
            Err(err) => {
                error!(error = %err, "Failed to evaluate scheduler gate");
                return TickReport::Errored { message: err.to_string() };
            }
        };

        let (outcome, report) = self.attempt().await;

        match self.controller.record_outcome(&ticket, &outcome).await {
            Ok(RecordResult::Applied(state)) => TickReport::Completed {
                trial: ticket.trial,
                outcome,
                superseded: false,
                report,
                state,
            },
            Ok(RecordResult::Superseded(state)) => TickReport::Completed {
                trial: ticket.trial,
                outcome,
                superseded: true,
                report,
                state,
            },
            Err(err) => {
                error!(error = %err, "Failed to record attempt outcome");
                TickReport::Errored { message: err.to_string() }
            }
        }
    }

    async fn attempt(&self) -> (RunOutcome, Option<FetchReport>) {
        let token = match self.tokens.valid_token().await {
            Ok(token) => token,
            Err(err) => {
                log_failure(&err, err.failure_kind(), "Could not obtain access token");
                return (RunOutcome::failure(err.failure_kind(), err.to_string()), None);
            }
        };

        // Separate task: a panic becomes a JoinError, a timeout aborts it
        let pipeline = Arc::clone(&self.pipeline);
        let mut handle = tokio::spawn(async move { pipeline.run(&token).await });

        match tokio::time::timeout(self.pipeline_timeout, &mut handle).await {
            Err(_) => {
                handle.abort();
                warn!(timeout = ?self.pipeline_timeout, "Fetch pipeline timed out");
                (
                    RunOutcome::failure(
                        FailureKind::Transient,
                        format!("fetch pipeline timed out after {:?}", self.pipeline_timeout),
                    ),
                    None,
                )
            }
            Ok(Err(join_err)) => {
                error!(error = %join_err, "Fetch pipeline task failed");
                (
                    RunOutcome::failure(
                        FailureKind::Pipeline,
                        format!("fetch pipeline task failed: {join_err}"),
                    ),
                    None,
                )
            }
            Ok(Ok(Err(err))) => {
                log_failure(&err, err.failure_kind(), "Fetch pipeline failed");
                (RunOutcome::failure(err.failure_kind(), err.to_string()), None)
            }
            Ok(Ok(Ok(report))) => {
                info!(listings = report.listings, "Fetch pipeline succeeded");
                (RunOutcome::Success, Some(report))
            }
        }
    }
}

/// Log level for a failed step, from its classification
fn failure_level(err: &impl ErrorClassification) -> Level {
    if err.is_critical() {
        return Level::ERROR;
    }
    match err.severity() {
        ErrorSeverity::Critical | ErrorSeverity::Error => Level::ERROR,
        ErrorSeverity::Warning => Level::WARN,
        ErrorSeverity::Info => Level::INFO,
    }
}

fn log_failure<E>(err: &E, kind: FailureKind, context: &str)
where
    E: ErrorClassification + Display,
{
    let retryable = err.is_retryable();
    let level = failure_level(err);
    if level == Level::ERROR {
        error!(error = %err, %kind, retryable, "{context}");
    } else if level == Level::WARN {
        warn!(error = %err, %kind, retryable, "{context}");
    } else {
        info!(error = %err, %kind, retryable, "{context}");
    }
}
