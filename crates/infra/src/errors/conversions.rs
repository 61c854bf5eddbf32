//! Conversions from external infrastructure errors into domain errors.

use jobscout_domain::JobScoutError;
use r2d2::Error as PoolError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub JobScoutError);

impl From<InfraError> for JobScoutError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<JobScoutError> for InfraError {
    fn from(value: JobScoutError) -> Self {
        InfraError(value)
    }
}

impl std::fmt::Display for InfraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for InfraError {}

trait IntoJobScoutError {
    fn into_jobscout(self) -> JobScoutError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → JobScoutError */
/* -------------------------------------------------------------------------- */

impl IntoJobScoutError for SqlError {
    fn into_jobscout(self) -> JobScoutError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        JobScoutError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        JobScoutError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 1555 | 2067) => {
                        JobScoutError::Conflict("unique constraint violation".into())
                    }
                    (ErrorCode::NotADatabase, _) => JobScoutError::Database(
                        "file is not a database or is corrupted".into(),
                    ),
                    _ => JobScoutError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => JobScoutError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                JobScoutError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                JobScoutError::Database(format!("invalid column type for '{name}': {ty}"))
            }
            RE::IntegralValueOutOfRange(column, value) => JobScoutError::Database(format!(
                "integer value {value} out of range in column {column}"
            )),
            RE::InvalidPath(path) => JobScoutError::Config(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => JobScoutError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_jobscout())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → JobScoutError */
/* -------------------------------------------------------------------------- */

impl IntoJobScoutError for PoolError {
    fn into_jobscout(self) -> JobScoutError {
        JobScoutError::Database(format!("connection pool error: {self}"))
    }
}

impl From<PoolError> for InfraError {
    fn from(value: PoolError) -> Self {
        InfraError(value.into_jobscout())
    }
}

/* -------------------------------------------------------------------------- */
/* tokio::task::JoinError → JobScoutError */
/* -------------------------------------------------------------------------- */

impl IntoJobScoutError for JoinError {
    fn into_jobscout(self) -> JobScoutError {
        if self.is_cancelled() {
            JobScoutError::Internal("blocking task cancelled".into())
        } else {
            JobScoutError::Internal(format!("blocking task failed: {self}"))
        }
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(value.into_jobscout())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → JobScoutError */
/* -------------------------------------------------------------------------- */

impl IntoJobScoutError for HttpError {
    fn into_jobscout(self) -> JobScoutError {
        if self.is_timeout() {
            return JobScoutError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return JobScoutError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => JobScoutError::Auth(message),
                404 => JobScoutError::NotFound(message),
                400..=499 if code != 429 => JobScoutError::InvalidInput(message),
                _ => JobScoutError::Network(message),
            };
        }

        JobScoutError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_jobscout())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
