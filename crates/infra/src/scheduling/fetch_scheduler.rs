//! Cron scheduler that fires guarded fetch attempts.
//!
//! Each firing calls [`TickJob::tick`] under a job timeout. The tick itself
//! decides (through the circuit breaker) whether anything runs, so the cron
//! schedule only sets the cadence.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use jobscout_core::SchedulerTrigger;
//! use jobscout_infra::scheduling::{FetchScheduler, FetchSchedulerConfig, SchedulerResult};
//!
//! # async fn example(trigger: Arc<SchedulerTrigger>) -> SchedulerResult<()> {
//! let mut scheduler = FetchScheduler::with_config(
//!     FetchSchedulerConfig { cron_expression: "0 0 * * * *".into(), ..Default::default() },
//!     trigger,
//! );
//!
//! scheduler.start().await?;
//! // ... until shutdown signal ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jobscout_core::{SchedulerTrigger, TickReport};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Work fired on every cron tick
#[async_trait]
pub trait TickJob: Send + Sync {
    async fn tick(&self) -> TickReport;
}

#[async_trait]
impl TickJob for SchedulerTrigger {
    async fn tick(&self) -> TickReport {
        SchedulerTrigger::tick(self).await
    }
}

/// Configuration for the fetch scheduler.
#[derive(Debug, Clone)]
pub struct FetchSchedulerConfig {
    /// Cron expression (with seconds field) describing the cadence.
    pub cron_expression: String,
    /// Upper bound on a single tick, including token refresh and pipeline.
    pub job_timeout: Duration,
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for FetchSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: jobscout_domain::constants::DEFAULT_CRON_EXPRESSION.into(),
            job_timeout: Duration::from_secs(600),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Fetch scheduler with explicit lifecycle management.
pub struct FetchScheduler {
    scheduler: Arc<RwLock<Option<JobScheduler>>>,
    config: FetchSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    job: Arc<dyn TickJob>,
}

impl FetchScheduler {
    /// Create a scheduler with the default timeouts.
    pub fn new(cron_expression: String, job: Arc<dyn TickJob>) -> Self {
        let config = FetchSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, job)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(config: FetchSchedulerConfig, job: Arc<dyn TickJob>) -> Self {
        Self {
            scheduler: Arc::new(RwLock::new(None)),
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            job,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    ///
    /// # Errors
    /// `AlreadyRunning`, an invalid cron expression, or a start failure or
    /// timeout from the underlying scheduler.
    #[instrument(skip(self), fields(cron = %self.config.cron_expression))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: start_timeout.as_secs() })?
            .map_err(|e| SchedulerError::StartFailed(e.to_string()))?;

        {
            let mut guard = self.scheduler.write().await;
            *guard = Some(scheduler_instance);
        }

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            cancel.cancelled().await;
            debug!("Fetch scheduler monitor cancelled");
        });

        self.monitor_handle = Some(handle);
        info!("Fetch scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    ///
    /// A tick already in flight is not interrupted; it converges on the same
    /// outcome-recording path as any other attempt.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let scheduler = {
            let mut guard = self.scheduler.write().await;
            guard.take()
        };
        let Some(mut scheduler) = scheduler else {
            return Err(SchedulerError::NotRunning);
        };

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })?
            .map_err(|e| SchedulerError::StopFailed(e.to_string()))?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
                .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;
        }

        info!("Fetch scheduler stopped");
        Ok(())
    }

    /// Returns true when the monitor task is active.
    pub fn is_running(&self) -> bool {
        self.monitor_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler =
            JobScheduler::new().await.map_err(|e| SchedulerError::CreationFailed(e.to_string()))?;
        let job = Arc::clone(&self.job);
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(self.config.cron_expression.as_str(), move |_id, _lock| {
            let job = Arc::clone(&job);

            Box::pin(async move {
                let started = Instant::now();
                match tokio::time::timeout(job_timeout, job.tick()).await {
                    Ok(TickReport::Skipped { reason }) => {
                        debug!(?reason, "Scheduled tick skipped");
                    }
                    Ok(TickReport::Completed { outcome, trial, superseded, .. }) => {
                        info!(
                            ?outcome,
                            trial,
                            superseded,
                            elapsed_ms = elapsed_millis(started),
                            "Scheduled tick completed"
                        );
                    }
                    Ok(TickReport::Errored { message }) => {
                        error!(error = %message, "Scheduled tick could not reach the state store");
                    }
                    Err(_) => {
                        warn!(timeout_secs = job_timeout.as_secs(), "Scheduled tick timed out");
                    }
                }
            })
        })
        .map_err(|e| SchedulerError::JobRegistrationFailed(e.to_string()))?;

        let job_id = scheduler
            .add(job_definition)
            .await
            .map_err(|e| SchedulerError::JobRegistrationFailed(e.to_string()))?;

        debug!(cron = %self.config.cron_expression, %job_id, "Registered fetch job");
        Ok(scheduler)
    }
}

impl Drop for FetchScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("FetchScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}

/// Milliseconds since `started`, saturating at `u64::MAX`
fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
