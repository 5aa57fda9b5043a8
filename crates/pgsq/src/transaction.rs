//! Transaction handle and outcome reporting.
//!
//! Transactions are driven by [`Database::transaction`](crate::Database::transaction): the
//! unit of work receives a [`Transaction`] handle, runs its statements through it and returns
//! a [`TxOutcome`]. The manager then commits or rolls back and reports what happened as a
//! [`TxReport`].
//!
//! ```ignore
//! let report = db
//!     .transaction(|tx| {
//!         Box::pin(async move {
//!             let moved = tx
//!                 .update(Qb::table::<TableAccount>().set("frozen", true).and("id", Op::equal(7)))
//!                 .await?;
//!             if moved == 0 {
//!                 return Ok(TxOutcome::RollbackWithError(OrmError::other("account 7 is gone")));
//!             }
//!             Ok(TxOutcome::Commit)
//!         })
//!     })
//!     .await;
//! ```

use crate::config::Config;
use crate::error::{OrmError, OrmResult};
use deadpool_postgres::Object;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// What the unit of work asks the manager to do.
#[derive(Debug)]
pub enum TxOutcome {
    Commit,
    /// Roll back without reporting an error.
    Rollback,
    /// Roll back and report the given error.
    RollbackWithError(OrmError),
}

/// Final state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxState {
    Committed,
    RolledBack,
    /// BEGIN never succeeded (no connection, or the server refused it).
    NotStarted,
}

/// Result of [`Database::transaction`](crate::Database::transaction).
#[derive(Debug)]
pub struct TxReport {
    pub state: TxState,
    /// The error that caused the rollback, or the commit/rollback failure itself.
    pub error: Option<OrmError>,
}

impl TxReport {
    pub(crate) fn not_started(error: OrmError) -> Self {
        Self {
            state: TxState::NotStarted,
            error: Some(error),
        }
    }

    fn committed() -> Self {
        Self {
            state: TxState::Committed,
            error: None,
        }
    }

    fn rolled_back_with(error: Option<OrmError>) -> Self {
        Self {
            state: TxState::RolledBack,
            error,
        }
    }

    /// Whether the transaction's changes were discarded.
    pub fn rolled_back(&self) -> bool {
        self.state == TxState::RolledBack
    }

    /// The reported error, or the final state when there is none.
    pub fn into_result(self) -> OrmResult<TxState> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.state),
        }
    }
}

/// A transaction in progress on one pooled connection.
///
/// Exposes the same operations as [`Database`](crate::Database). A statement that fails on
/// the server poisons the handle: PostgreSQL has already aborted the transaction, so a later
/// [`TxOutcome::Commit`] is turned into a rollback.
///
/// Dropping a handle that is still active (for example when the caller's future is
/// cancelled) closes its connection instead of returning it to the pool; the server then
/// aborts the transaction.
pub struct Transaction {
    conn: Option<Object>,
    config: Arc<Config>,
    poison: OnceLock<String>,
}

impl Transaction {
    pub(crate) fn new(conn: Object, config: Arc<Config>) -> Self {
        Self {
            conn: Some(conn),
            config,
            poison: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The first server-side failure seen through this handle.
    pub fn poisoned(&self) -> Option<&str> {
        self.poison.get().map(String::as_str)
    }

    async fn lease(&self) -> OrmResult<&Object> {
        self.conn
            .as_ref()
            .ok_or_else(|| OrmError::Transaction("transaction already finished".to_string()))
    }

    /// Record failures that reached the server; client-side validation errors do not abort
    /// the transaction.
    fn observe<T>(&self, result: OrmResult<T>) -> OrmResult<T> {
        if let Err(error) = &result {
            let aborts = matches!(
                error,
                OrmError::Query(_)
                    | OrmError::UniqueViolation(_)
                    | OrmError::ForeignKeyViolation(_)
                    | OrmError::CheckViolation(_)
                    | OrmError::Connection(_)
                    | OrmError::Timeout(_)
            );
            if aborts {
                let _ = self.poison.set(error.to_string());
            }
        }
        result
    }

    impl_session_ops!();

    pub(crate) async fn commit(mut self) -> TxReport {
        let Some(conn) = self.conn.take() else {
            return TxReport::committed();
        };
        match conn.batch_execute("COMMIT").await {
            Ok(()) => {
                tracing::debug!(target: "pgsq", "transaction committed");
                TxReport::committed()
            }
            Err(e) => {
                // A failed COMMIT leaves nothing applied; the connection state is unknown.
                tracing::warn!(target: "pgsq", error = %e, "commit failed");
                discard(conn);
                TxReport::rolled_back_with(Some(OrmError::from_db_error(e)))
            }
        }
    }

    /// Roll back, reporting `error` as the cause.
    pub(crate) async fn rollback(mut self, error: Option<OrmError>) -> TxReport {
        let Some(conn) = self.conn.take() else {
            return TxReport::rolled_back_with(error);
        };
        match conn.batch_execute("ROLLBACK").await {
            Ok(()) => {
                tracing::debug!(target: "pgsq", "transaction rolled back");
                TxReport::rolled_back_with(error)
            }
            Err(rollback_err) => {
                discard(conn);
                let message = match error {
                    Some(error) => format!("{error} (rollback failed: {rollback_err})"),
                    None => format!("rollback failed: {rollback_err}"),
                };
                TxReport::rolled_back_with(Some(OrmError::Transaction(message)))
            }
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!(
                target: "pgsq",
                "transaction dropped while active; closing its connection"
            );
            discard(conn);
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("active", &self.conn.is_some())
            .field("poisoned", &self.poisoned())
            .finish()
    }
}

/// Detach the connection from the pool and close it.
fn discard(conn: Object) {
    drop(Object::take(conn));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accessors() {
        let report = TxReport::committed();
        assert!(!report.rolled_back());
        assert_eq!(report.into_result().unwrap(), TxState::Committed);

        let report = TxReport::rolled_back_with(None);
        assert!(report.rolled_back());
        assert_eq!(report.into_result().unwrap(), TxState::RolledBack);

        let report = TxReport::rolled_back_with(Some(OrmError::other("insufficient funds")));
        assert!(report.rolled_back());
        assert_eq!(report.into_result().unwrap_err().to_string(), "insufficient funds");

        let report = TxReport::not_started(OrmError::Pool("timed out".into()));
        assert!(!report.rolled_back());
        assert_eq!(report.state, TxState::NotStarted);
    }
}
