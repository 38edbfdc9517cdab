//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Translate between board tables and DTOs.
//! - Enforce existence/conflict rules and the work item lifecycle.
//!
//! # Invariants
//! - Every mutating call runs inside one explicit transaction; early-return
//!   outcomes drop the transaction, which rolls back.
//! - Expected failures are `Response` values; `RepoError` is reserved for
//!   storage faults and unreadable persisted data.
//! - Log lines carry ids and outcomes only, never names, titles or emails.

use crate::db::DbError;
use crate::model::response::Response;
use crate::model::validation::ValidationError;
use log::{log, warn, Level};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod schema_guard;
pub mod tag_repo;
pub mod user_repo;
pub mod work_item_repo;

/// SQL expression for the current time in epoch milliseconds.
pub(crate) const NOW_EPOCH_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Fault raised by repository construction or persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error, including constraint violations.
    Db(DbError),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted board data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "board repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Emits the single outcome line every repository operation ends with.
///
/// Mutations log at `info`; refused requests log at `warn`.
pub(crate) fn log_outcome(event: &'static str, id: Option<i64>, response: Response) {
    let level = outcome_level(response);
    match id {
        Some(id) => log!(
            level,
            "event={event} module=repo status={} outcome={response:?} id={id}",
            response.as_str()
        ),
        None => log!(
            level,
            "event={event} module=repo status={} outcome={response:?}",
            response.as_str()
        ),
    }
}

/// Logs a `BadRequest` caused by field validation.
///
/// Only the field name and error code are logged, never the rejected value.
pub(crate) fn log_rejected(event: &'static str, id: Option<i64>, err: &ValidationError) {
    let id = id.map_or_else(|| "none".to_string(), |id| id.to_string());
    warn!(
        "event={event} module=repo status={} id={id} error_code={} field={}",
        Response::BadRequest.as_str(),
        err.error_code(),
        err.field()
    );
}

fn outcome_level(response: Response) -> Level {
    if response.is_success() {
        Level::Info
    } else {
        Level::Warn
    }
}
