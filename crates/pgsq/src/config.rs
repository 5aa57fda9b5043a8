//! Executor configuration.

use crate::dialect::Dialect;
use crate::logging::SqlLog;
use std::time::Duration;

/// Settings shared by [`Executor`](crate::Executor), [`Database`](crate::Database) and
/// [`Transaction`](crate::Transaction).
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Quoting and placeholder conventions.
    pub dialect: Dialect,
    /// Per-statement timeout. On expiry the server-side statement is cancelled and the call
    /// fails with [`OrmError::Timeout`](crate::OrmError::Timeout).
    pub statement_timeout: Option<Duration>,
    /// SQL logging.
    pub sql_log: SqlLog,
}

impl Config {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the statement timeout.
    pub fn statement_timeout(mut self, duration: Duration) -> Self {
        self.statement_timeout = Some(duration);
        self
    }

    pub fn sql_log(mut self, sql_log: SqlLog) -> Self {
        self.sql_log = sql_log;
        self
    }
}
