//! Error types for pgsq

use crate::qb::StatementKind;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for pgsq operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Marker carried by every [`OrmError::MissingWhere`] message.
///
/// Tests and log filters can match on it without depending on the full wording.
pub const MISSING_WHERE_MARKER: &str = "MAYBE_FORGET_WHERE";

/// Error types for database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Builder or mapping validation error, raised before any SQL is sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// A mutating statement was built without a predicate.
    #[error(
        "{statement} on \"{table}\" has an empty WHERE ({MISSING_WHERE_MARKER}); call allow_all_rows() to affect every row"
    )]
    MissingWhere {
        statement: StatementKind,
        table: String,
    },

    /// Rendered SQL did not match any of the expected statements
    #[error("SQL mismatch: rendered {actual:?}, expected one of {expected:?}")]
    SqlMismatch {
        expected: Vec<String>,
        actual: String,
    },

    /// Pool error
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(Duration),

    /// Transaction control error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a free-form error, e.g. the reason passed to
    /// [`TxOutcome::RollbackWithError`](crate::TxOutcome::RollbackWithError).
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Check if this is the empty-predicate guard
    pub fn is_missing_where(&self) -> bool {
        matches!(self, Self::MissingWhere { .. })
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Parse a tokio_postgres error into a more specific OrmError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
