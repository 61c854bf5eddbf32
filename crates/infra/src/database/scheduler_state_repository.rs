//! SQLite-backed scheduler state store.
//!
//! Implements the `SchedulerStateStore` port. The `version` column is the
//! optimistic-concurrency token: every write is an `UPDATE ... WHERE version
//! = ?` and reports a conflict when no row changed. All database operations
//! run in `spawn_blocking` to avoid blocking the async runtime.

use std::sync::Arc;

use async_trait::async_trait;
use jobscout_core::SchedulerStateStore;
use jobscout_domain::{JobScoutError, Result, SchedulerState, Versioned};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use tracing::debug;

use super::manager::{map_sql_error, DbManager, SqliteConnection};
use super::time::{from_millis, from_millis_opt, to_millis, to_millis_opt};
use crate::errors::InfraError;

const SELECT_STATE: &str = "SELECT version, enabled, consecutive_failures, circuit_open,
        circuit_open_until, last_run, last_success, last_error, updated_at
     FROM scheduler_state WHERE id = ?1";

/// SQLite-backed scheduler state store.
pub struct SqliteSchedulerStateStore {
    db: Arc<DbManager>,
}

impl SqliteSchedulerStateStore {
    /// Create a new store with the given database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SchedulerStateStore for SqliteSchedulerStateStore {
    async fn load(&self, id: &str) -> Result<Option<Versioned<SchedulerState>>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<Option<Versioned<SchedulerState>>> {
            let conn = db.get_connection()?;
            query_state(&conn, &id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn create_if_absent(
        &self,
        id: &str,
        state: &SchedulerState,
    ) -> Result<(Versioned<SchedulerState>, bool)> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let state = state.clone();

        task::spawn_blocking(move || -> Result<(Versioned<SchedulerState>, bool)> {
            let conn = db.get_connection()?;
            let created = insert_state_if_absent(&conn, &id, &state)?;
            let stored = query_state(&conn, &id)?.ok_or_else(|| {
                JobScoutError::Internal(format!("scheduler state '{id}' vanished after insert"))
            })?;
            debug!(state_id = %id, created, version = stored.version, "scheduler state ensured");
            Ok((stored, created))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn compare_and_swap(
        &self,
        id: &str,
        expected_version: u64,
        state: &SchedulerState,
    ) -> Result<Option<u64>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let state = state.clone();

        task::spawn_blocking(move || -> Result<Option<u64>> {
            let conn = db.get_connection()?;
            let changed = update_state_if_version(&conn, &id, expected_version, &state)?;
            if changed {
                Ok(Some(expected_version + 1))
            } else {
                debug!(state_id = %id, expected_version, "scheduler state version conflict");
                Ok(None)
            }
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_state(conn: &SqliteConnection, id: &str) -> Result<Option<Versioned<SchedulerState>>> {
    let row = conn
        .query_row(SELECT_STATE, params![id], read_row)
        .optional()
        .map_err(map_sql_error)?;

    row.map(StateRow::into_versioned).transpose()
}

/// Returns `true` when a row was inserted.
fn insert_state_if_absent(conn: &SqliteConnection, id: &str, state: &SchedulerState) -> Result<bool> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO scheduler_state (
                id, version, enabled, consecutive_failures, circuit_open,
                circuit_open_until, last_run, last_success, last_error, updated_at
             ) VALUES (?1, 1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                state.enabled,
                state.consecutive_failures,
                state.circuit_open,
                to_millis_opt(state.circuit_open_until),
                to_millis_opt(state.last_run),
                to_millis_opt(state.last_success),
                state.last_error,
                to_millis(state.updated_at),
            ],
        )
        .map_err(map_sql_error)?;
    Ok(inserted == 1)
}

/// Returns `true` when the stored version matched and the row was replaced.
fn update_state_if_version(
    conn: &SqliteConnection,
    id: &str,
    expected_version: u64,
    state: &SchedulerState,
) -> Result<bool> {
    let expected = i64::try_from(expected_version)
        .map_err(|_| JobScoutError::InvalidInput(format!("version {expected_version} out of range")))?;

    let changed = conn
        .execute(
            "UPDATE scheduler_state SET
                version = version + 1,
                enabled = ?3,
                consecutive_failures = ?4,
                circuit_open = ?5,
                circuit_open_until = ?6,
                last_run = ?7,
                last_success = ?8,
                last_error = ?9,
                updated_at = ?10
             WHERE id = ?1 AND version = ?2",
            params![
                id,
                expected,
                state.enabled,
                state.consecutive_failures,
                state.circuit_open,
                to_millis_opt(state.circuit_open_until),
                to_millis_opt(state.last_run),
                to_millis_opt(state.last_success),
                state.last_error,
                to_millis(state.updated_at),
            ],
        )
        .map_err(map_sql_error)?;
    Ok(changed == 1)
}

/// Raw column values; timestamp conversion happens outside the row closure so
/// a corrupt value surfaces as a domain error.
struct StateRow {
    version: i64,
    enabled: bool,
    consecutive_failures: u32,
    circuit_open: bool,
    circuit_open_until: Option<i64>,
    last_run: Option<i64>,
    last_success: Option<i64>,
    last_error: Option<String>,
    updated_at: i64,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StateRow> {
    Ok(StateRow {
        version: row.get(0)?,
        enabled: row.get(1)?,
        consecutive_failures: row.get(2)?,
        circuit_open: row.get(3)?,
        circuit_open_until: row.get(4)?,
        last_run: row.get(5)?,
        last_success: row.get(6)?,
        last_error: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl StateRow {
    fn into_versioned(self) -> Result<Versioned<SchedulerState>> {
        let version = u64::try_from(self.version).map_err(|_| {
            JobScoutError::Database(format!("negative scheduler state version {}", self.version))
        })?;
        Ok(Versioned::new(
            version,
            SchedulerState {
                enabled: self.enabled,
                consecutive_failures: self.consecutive_failures,
                circuit_open: self.circuit_open,
                circuit_open_until: from_millis_opt(self.circuit_open_until)?,
                last_run: from_millis_opt(self.last_run)?,
                last_success: from_millis_opt(self.last_success)?,
                last_error: self.last_error,
                updated_at: from_millis(self.updated_at)?,
            },
        ))
    }
}

fn map_join_error(err: task::JoinError) -> JobScoutError {
    JobScoutError::from(InfraError::from(err))
}
