//! Error types for the migration tooling, plus classification of the
//! constraint violations PostgreSQL raises against the schema.

use goalbot_core::error::CoreError;

/// Failures of the migration runner.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// The migration list is not strictly increasing by version.
    #[error("Migration {version} ({name}) is out of order: must be greater than {previous}")]
    InvalidOrder {
        version: i64,
        name: String,
        previous: i64,
    },

    /// An applied migration's SQL no longer matches what the ledger recorded.
    #[error(
        "Migration {version} ({name}) was applied with checksum {recorded} \
         but the current file hashes to {expected}"
    )]
    ChecksumMismatch {
        version: i64,
        name: String,
        recorded: String,
        expected: String,
    },

    /// A migration's SQL failed; its own transaction was rolled back.
    #[error("Migration {version} ({name}) failed: {source}")]
    Failed {
        version: i64,
        name: String,
        #[source]
        source: sqlx::Error,
    },

    /// Reading or writing the migration ledger failed.
    #[error("Migration ledger error: {0}")]
    Ledger(#[from] sqlx::Error),
}

/// PostgreSQL SQLSTATE codes for integrity constraint violations.
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const NOT_NULL_VIOLATION: &str = "23502";

/// A rejected write, classified by the kind of constraint that rejected it.
///
/// The payload is the constraint name when PostgreSQL reports one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    Unique(String),
    Check(String),
    ForeignKey(String),
    NotNull(String),
}

/// Classify a sqlx error as a constraint violation, if it is one.
pub fn constraint_violation(err: &sqlx::Error) -> Option<ConstraintViolation> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    let code = db_err.code()?;
    let constraint = db_err.constraint().unwrap_or("unknown").to_string();
    match &*code {
        UNIQUE_VIOLATION => Some(ConstraintViolation::Unique(constraint)),
        CHECK_VIOLATION => Some(ConstraintViolation::Check(constraint)),
        FOREIGN_KEY_VIOLATION => Some(ConstraintViolation::ForeignKey(constraint)),
        NOT_NULL_VIOLATION => {
            let column = db_err
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg| pg.column())
                .unwrap_or("unknown");
            Some(ConstraintViolation::NotNull(column.to_string()))
        }
        _ => None,
    }
}

/// Map a database error onto the domain error type.
///
/// Uniqueness violations become [`CoreError::Conflict`], the other
/// constraint kinds [`CoreError::Validation`]; anything else is internal.
pub fn into_core_error(err: sqlx::Error) -> CoreError {
    match constraint_violation(&err) {
        Some(ConstraintViolation::Unique(name)) => {
            CoreError::Conflict(format!("Duplicate value violates unique constraint: {name}"))
        }
        Some(ConstraintViolation::Check(name)) => {
            CoreError::Validation(format!("Value rejected by check constraint: {name}"))
        }
        Some(ConstraintViolation::ForeignKey(name)) => {
            CoreError::Validation(format!("Referenced row does not exist: {name}"))
        }
        Some(ConstraintViolation::NotNull(column)) => {
            CoreError::Validation(format!("Missing required value: {column}"))
        }
        None => {
            tracing::error!(error = %err, "Database error");
            CoreError::Internal(err.to_string())
        }
    }
}
