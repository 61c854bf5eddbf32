//! Daemon mode: cron-driven ticks until a shutdown signal

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use jobscout_infra::scheduling::{FetchScheduler, FetchSchedulerConfig, TickJob};
use tracing::{info, warn};

use crate::context::AppContext;

/// Slack on top of the refresh and pipeline timeouts for state store I/O
const JOB_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

pub async fn run(ctx: &AppContext, cron_override: Option<String>) -> anyhow::Result<()> {
    if ctx.admin.initialize().await? {
        info!("Created scheduler state on first start");
    }

    let cron_expression = cron_override.unwrap_or_else(|| ctx.config.scheduler.cron_expression.clone());
    let config = FetchSchedulerConfig {
        cron_expression: cron_expression.clone(),
        job_timeout: ctx.config.auth.refresh_timeout()
            + ctx.config.scheduler.pipeline_timeout()
            + JOB_TIMEOUT_MARGIN,
        ..Default::default()
    };

    let job: Arc<dyn TickJob> = ctx.trigger.clone();
    let mut scheduler = FetchScheduler::with_config(config, job);
    scheduler
        .start()
        .await
        .with_context(|| format!("failed to start scheduler with cron '{cron_expression}'"))?;
    info!(cron = %cron_expression, "Daemon running; waiting for shutdown signal");

    shutdown_signal().await;
    info!("Shutdown signal received; stopping scheduler");

    if let Err(err) = scheduler.stop().await {
        warn!(error = %err, "Scheduler did not stop cleanly");
    }
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
