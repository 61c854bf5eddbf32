//! SQLite-backed credential store.
//!
//! Implements the `CredentialStore` port. `replace_if_unchanged` writes all
//! four credential fields in one statement conditioned on the refresh token
//! the caller read, which keeps refreshes from different processes from
//! overwriting each other.

use std::sync::Arc;

use async_trait::async_trait;
use jobscout_core::CredentialStore;
use jobscout_domain::{CredentialRecord, JobScoutError, Result};
use rusqlite::{params, OptionalExtension};
use tokio::task;
use tracing::debug;

use super::manager::{map_sql_error, DbManager, SqliteConnection};
use super::time::{from_millis, to_millis};
use crate::errors::InfraError;

/// SQLite-backed credential store.
pub struct SqliteCredentialStore {
    db: Arc<DbManager>,
}

impl SqliteCredentialStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn load(&self, id: &str) -> Result<Option<CredentialRecord>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<Option<CredentialRecord>> {
            let conn = db.get_connection()?;
            query_credential(&conn, &id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn put(&self, id: &str, record: &CredentialRecord) -> Result<()> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let record = record.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            upsert_credential(&conn, &id, &record)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn replace_if_unchanged(
        &self,
        id: &str,
        expected_refresh_token: &str,
        record: &CredentialRecord,
    ) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        let expected = expected_refresh_token.to_string();
        let record = record.clone();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let replaced = replace_credential_if(&conn, &id, &expected, &record)?;
            if !replaced {
                debug!(credential_id = %id, "credential changed since it was read");
            }
            Ok(replaced)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_credential(conn: &SqliteConnection, id: &str) -> Result<Option<CredentialRecord>> {
    let row = conn
        .query_row(
            "SELECT access_token, refresh_token, expires_at, updated_at
             FROM credentials WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()
        .map_err(map_sql_error)?;

    row.map(|(access_token, refresh_token, expires_at, updated_at)| {
        Ok(CredentialRecord::new(
            access_token,
            refresh_token,
            from_millis(expires_at)?,
            from_millis(updated_at)?,
        ))
    })
    .transpose()
}

fn upsert_credential(conn: &SqliteConnection, id: &str, record: &CredentialRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO credentials (id, access_token, refresh_token, expires_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = excluded.refresh_token,
            expires_at = excluded.expires_at,
            updated_at = excluded.updated_at",
        params![
            id,
            record.access_token,
            record.refresh_token,
            to_millis(record.expires_at),
            to_millis(record.updated_at),
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn replace_credential_if(
    conn: &SqliteConnection,
    id: &str,
    expected_refresh_token: &str,
    record: &CredentialRecord,
) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE credentials SET
                access_token = ?3,
                refresh_token = ?4,
                expires_at = ?5,
                updated_at = ?6
             WHERE id = ?1 AND refresh_token = ?2",
            params![
                id,
                expected_refresh_token,
                record.access_token,
                record.refresh_token,
                to_millis(record.expires_at),
                to_millis(record.updated_at),
            ],
        )
        .map_err(map_sql_error)?;
    Ok(changed == 1)
}

fn map_join_error(err: task::JoinError) -> JobScoutError {
    JobScoutError::from(InfraError::from(err))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    async fn setup() -> (SqliteCredentialStore, TempDir) {
        let dir = TempDir::new().expect("temp dir created");
        let db = DbManager::new(dir.path().join("credentials.db"), 2).expect("manager created");
        db.run_migrations().expect("migrations run");
        (SqliteCredentialStore::new(Arc::new(db)), dir)
    }

    fn record(access: &str, refresh: &str) -> CredentialRecord {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        CredentialRecord::new(access, refresh, now + Duration::hours(1), now)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn put_then_load_round_trips() {
        let (store, _dir) = setup().await;
        let original = record("access-0", "refresh-0");

        store.put("marketplace", &original).await.expect("put");

        let loaded = store.load("marketplace").await.expect("load");
        assert_eq!(loaded, Some(original));
        assert!(store.load("other").await.expect("load").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn put_overwrites_existing_record() {
        let (store, _dir) = setup().await;
        store.put("marketplace", &record("access-0", "refresh-0")).await.expect("put");
        store.put("marketplace", &record("access-1", "refresh-1")).await.expect("put");

        let loaded = store.load("marketplace").await.expect("load").expect("present");
        assert_eq!(loaded.refresh_token, "refresh-1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replace_requires_matching_refresh_token() {
        let (store, _dir) = setup().await;
        store.put("marketplace", &record("access-0", "refresh-0")).await.expect("put");

        let rotated = record("access-1", "refresh-1");
        assert!(store.replace_if_unchanged("marketplace", "refresh-0", &rotated).await.unwrap());

        let late = record("access-2", "refresh-2");
        assert!(!store.replace_if_unchanged("marketplace", "refresh-0", &late).await.unwrap());

        let loaded = store.load("marketplace").await.expect("load").expect("present");
        assert_eq!(loaded, rotated);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replace_on_missing_record_is_refused() {
        let (store, _dir) = setup().await;
        let replaced = store
            .replace_if_unchanged("marketplace", "refresh-0", &record("a", "r"))
            .await
            .expect("query");
        assert!(!replaced);
    }
}
