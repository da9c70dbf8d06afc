//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use taskbridge_common::storage::StorageError;
use taskbridge_domain::TaskBridgeError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub TaskBridgeError);

impl From<InfraError> for TaskBridgeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TaskBridgeError> for InfraError {
    fn from(value: TaskBridgeError) -> Self {
        InfraError(value)
    }
}

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;

        let domain = match err {
            SqlError::SqliteFailure(code, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match code.code {
                    ErrorCode::DatabaseBusy => {
                        TaskBridgeError::Database("database is busy".into())
                    }
                    ErrorCode::DatabaseLocked => {
                        TaskBridgeError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => TaskBridgeError::Database(format!(
                        "constraint violation (code {}): {message}",
                        code.extended_code
                    )),
                    _ => TaskBridgeError::Database(format!(
                        "sqlite failure {:?} (code {}): {message}",
                        code.code, code.extended_code
                    )),
                }
            }
            SqlError::QueryReturnedNoRows => {
                TaskBridgeError::NotFound("no rows returned by query".into())
            }
            SqlError::FromSqlConversionFailure(_, _, cause) => {
                TaskBridgeError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            SqlError::InvalidColumnType(_, _, ty) => {
                TaskBridgeError::Database(format!("invalid column type: {ty}"))
            }
            other => TaskBridgeError::Database(other.to_string()),
        };
        InfraError(domain)
    }
}

impl From<StorageError> for InfraError {
    fn from(err: StorageError) -> Self {
        let domain = match err {
            StorageError::PoolExhausted => {
                TaskBridgeError::Database("connection pool exhausted".into())
            }
            StorageError::Rusqlite(sql) => return InfraError::from(sql),
            other => TaskBridgeError::Database(other.to_string()),
        };
        InfraError(domain)
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        InfraError(TaskBridgeError::Database(format!("pool error: {err}")))
    }
}

impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        let domain = if err.is_timeout() {
            TaskBridgeError::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            TaskBridgeError::Network(format!("connection failed: {err}"))
        } else if let Some(status) = err.status() {
            TaskBridgeError::Network(format!("unexpected status {status}: {err}"))
        } else {
            TaskBridgeError::Network(err.to_string())
        };
        InfraError(domain)
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(err: serde_json::Error) -> Self {
        InfraError(TaskBridgeError::Internal(format!("serialization failure: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_maps_to_not_found() {
        let err: TaskBridgeError = InfraError::from(SqlError::QueryReturnedNoRows).into();
        assert!(matches!(err, TaskBridgeError::NotFound(_)));
    }

    #[test]
    fn pool_exhaustion_maps_to_database() {
        let err: TaskBridgeError = InfraError::from(StorageError::PoolExhausted).into();
        assert!(matches!(err, TaskBridgeError::Database(_)));
    }
}
