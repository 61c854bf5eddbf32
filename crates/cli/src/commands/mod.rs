//! Operator commands
//!
//! Each command prints a human-readable result on stdout; `status --json` and
//! `tick` emit JSON so they can be scripted.

mod daemon;

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::Context;
use jobscout_core::{StatusSnapshot, TickReport};
use jobscout_domain::SchedulerState;

use crate::cli::ImportArgs;
use crate::context::AppContext;

pub use daemon::run;

pub async fn init(ctx: &AppContext) -> anyhow::Result<()> {
    let created = ctx.admin.initialize().await?;
    if created {
        println!("Initialized scheduler state '{}'", ctx.config.scheduler.state_id);
    } else {
        println!("Scheduler state '{}' already exists", ctx.config.scheduler.state_id);
    }
    Ok(())
}

pub async fn status(ctx: &AppContext, json: bool) -> anyhow::Result<()> {
    ctx.db.health_check()?;
    let snapshot = ctx.admin.snapshot().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", render_status(&snapshot));
    }
    Ok(())
}

pub async fn set_enabled(ctx: &AppContext, enabled: bool) -> anyhow::Result<()> {
    let state = ctx.admin.set_enabled(enabled).await?;
    println!("Scheduler {}", if state.enabled { "enabled" } else { "disabled" });
    Ok(())
}

pub async fn reset(ctx: &AppContext) -> anyhow::Result<()> {
    let state = ctx.admin.reset().await?;
    println!("Scheduler reset; circuit {}", circuit_label(&state));
    Ok(())
}

/// One guarded attempt. The outcome is reported, not turned into an exit
/// status: a failed fetch is already recorded by the breaker.
pub async fn tick(ctx: &AppContext) -> anyhow::Result<()> {
    let report = ctx.trigger.tick().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if let TickReport::Errored { message } = &report {
        tracing::error!(error = %message, "Tick could not reach the state store");
    }
    Ok(())
}

pub async fn import_credentials(ctx: &AppContext, args: ImportArgs) -> anyhow::Result<()> {
    let record = ctx
        .admin
        .import_credentials(&args.access_token, &args.refresh_token, Duration::from_secs(args.expires_in))
        .await
        .context("failed to import credential")?;
    println!(
        "Stored credential '{}' (access token expires {})",
        ctx.config.auth.credential_id,
        record.expires_at.to_rfc3339()
    );
    Ok(())
}

fn circuit_label(state: &SchedulerState) -> &'static str {
    if state.circuit_open {
        "open"
    } else {
        "closed"
    }
}

fn render_status(snapshot: &StatusSnapshot) -> String {
    let state = &snapshot.state;
    let when = |t: Option<jobscout_domain::Timestamp>| {
        t.map(|t| t.to_rfc3339()).unwrap_or_else(|| "never".to_string())
    };

    let mut out = String::new();
    let _ = writeln!(out, "Health:               {} ({})", snapshot.health.status, snapshot.health.summary);
    let _ = writeln!(out, "Enabled:              {}", state.enabled);
    let _ = writeln!(out, "Circuit:              {}", snapshot.circuit);
    if let Some(until) = state.circuit_open_until {
        let _ = writeln!(out, "Open until:           {}", until.to_rfc3339());
    }
    let _ = writeln!(out, "Consecutive failures: {}", state.consecutive_failures);
    let _ = writeln!(out, "Last run:             {}", when(state.last_run));
    let _ = writeln!(out, "Last success:         {}", when(state.last_success));
    if let Some(error) = &state.last_error {
        let _ = writeln!(out, "Last error:           {error}");
    }
    let _ = writeln!(out, "Updated at:           {}", state.updated_at.to_rfc3339());
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use jobscout_core::HealthReport;
    use jobscout_domain::HealthStatus;

    use super::*;

    fn snapshot(state: SchedulerState) -> StatusSnapshot {
        StatusSnapshot {
            circuit: if state.circuit_open { "OPEN" } else { "CLOSED" }.to_string(),
            health: HealthReport {
                status: HealthStatus::CoolingDown,
                healthy: false,
                summary: "Circuit open".into(),
            },
            version: 7,
            state,
        }
    }

    #[test]
    fn status_renders_open_circuit_details() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut state = SchedulerState::new(now);
        state.circuit_open = true;
        state.circuit_open_until = Some(now + chrono::Duration::hours(6));
        state.consecutive_failures = 3;
        state.last_error = Some("HTTP 503".into());

        let rendered = render_status(&snapshot(state));

        assert!(rendered.contains("Circuit:              OPEN"));
        assert!(rendered.contains("Open until:           2025-06-01T18:00:00+00:00"));
        assert!(rendered.contains("Consecutive failures: 3"));
        assert!(rendered.contains("Last error:           HTTP 503"));
        assert!(rendered.contains("Last success:         never"));
    }

    #[test]
    fn status_omits_absent_fields() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let rendered = render_status(&snapshot(SchedulerState::new(now)));

        assert!(!rendered.contains("Open until"));
        assert!(!rendered.contains("Last error"));
    }
}
