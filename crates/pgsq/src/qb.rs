//! Query descriptors.
//!
//! A [`Qb`] captures everything one statement needs: table, projection, predicate, insert or
//! update pairs, ordering, limit and soft-delete policy. It is built fresh for each call and
//! handed to an executor, which renders it together with a [`StatementKind`].
//!
//! ```ignore
//! use pgsq::{Op, Qb};
//!
//! let qb = Qb::table::<TableUser>()
//!     .and("name", Op::like_left("Test"))
//!     .desc("created_at")
//!     .limit(10);
//! let users: Vec<User> = db.query_all(qb).await?;
//! ```

use crate::column::{Column, Direction, Insert, OrderBy, Update};
use crate::condition::{Op, Where};
use crate::error::{OrmError, OrmResult};
use crate::param::Param;
use crate::table::{DescribesTable, TableDef};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_postgres::types::ToSql;

/// The statement a descriptor is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    /// UPDATE setting the soft-delete column.
    SoftDelete,
    /// Physical DELETE.
    HardDelete,
    Count,
    Sum,
    Has,
    /// Two-table LEFT JOIN select.
    Relation,
    /// Caller-supplied SQL text.
    Raw,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::SoftDelete => "soft DELETE",
            StatementKind::HardDelete => "DELETE",
            StatementKind::Count => "COUNT",
            StatementKind::Sum => "SUM",
            StatementKind::Has => "EXISTS",
            StatementKind::Relation => "JOIN SELECT",
            StatementKind::Raw => "raw statement",
        })
    }
}

/// Query descriptor.
#[derive(Debug, Clone, Default)]
pub struct Qb {
    pub(crate) table: Option<&'static TableDef>,
    pub(crate) select: Vec<Column>,
    pub(crate) filter: Where,
    pub(crate) insert: Vec<Insert>,
    pub(crate) update: Vec<Update>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<i64>,
    pub(crate) disable_soft_delete: bool,
    pub(crate) allow_all_rows: bool,
    pub(crate) check_sql: Vec<String>,
}

impl Qb {
    /// An empty descriptor; model operations fill in the table from the model.
    pub fn new() -> Self {
        Self::default()
    }

    /// A descriptor targeting the table described by `T`.
    pub fn table<T: DescribesTable>() -> Self {
        Self::new().table_def(T::table())
    }

    pub fn table_def(mut self, table: &'static TableDef) -> Self {
        self.table = Some(table);
        self
    }

    /// Explicit projection. Without one, selects project the destination model's columns.
    pub fn select<C: Into<Column>>(mut self, columns: impl IntoIterator<Item = C>) -> Self {
        self.select.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Replace the predicate.
    pub fn filter(mut self, filter: Where) -> Self {
        self.filter = filter;
        self
    }

    /// AND a condition onto the predicate.
    pub fn and(mut self, column: impl Into<Column>, op: Op) -> Self {
        self.filter = self.filter.and(column, op);
        self
    }

    /// OR a condition onto the predicate.
    pub fn or(mut self, column: impl Into<Column>, op: Op) -> Self {
        self.filter = self.filter.or(column, op);
        self
    }

    /// Add an INSERT column/value pair.
    pub fn value<T: ToSql + Send + Sync + 'static>(
        mut self,
        column: impl Into<Column>,
        value: T,
    ) -> Self {
        self.insert.push(crate::column::value(column, value));
        self
    }

    pub fn insert(mut self, pairs: impl IntoIterator<Item = Insert>) -> Self {
        self.insert.extend(pairs);
        self
    }

    /// Add an UPDATE `SET column = value` pair.
    pub fn set<T: ToSql + Send + Sync + 'static>(
        mut self,
        column: impl Into<Column>,
        value: T,
    ) -> Self {
        self.update.push(crate::column::set(column, value));
        self
    }

    pub fn update(mut self, pairs: impl IntoIterator<Item = Update>) -> Self {
        self.update.extend(pairs);
        self
    }

    pub fn order_by(mut self, column: impl Into<Column>, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn asc(self, column: impl Into<Column>) -> Self {
        self.order_by(column, Direction::Asc)
    }

    pub fn desc(self, column: impl Into<Column>) -> Self {
        self.order_by(column, Direction::Desc)
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Include soft-deleted rows (reads) and ignore the soft-delete state (updates).
    pub fn disable_soft_delete(mut self) -> Self {
        self.disable_soft_delete = true;
        self
    }

    /// Allow UPDATE/DELETE without a predicate. Without this, an empty predicate on a mutating
    /// statement fails with [`OrmError::MissingWhere`].
    pub fn allow_all_rows(mut self) -> Self {
        self.allow_all_rows = true;
        self
    }

    /// Expected SQL texts. When non-empty, the rendered statement must equal one of them or the
    /// call fails with [`OrmError::SqlMismatch`] before execution. Intended for tests.
    pub fn check_sql<S: Into<String>>(mut self, expected: impl IntoIterator<Item = S>) -> Self {
        self.check_sql.extend(expected.into_iter().map(Into::into));
        self
    }

    pub fn where_clause(&self) -> &Where {
        &self.filter
    }

    pub(crate) fn require_table(&self) -> OrmResult<&'static TableDef> {
        self.table
            .ok_or_else(|| OrmError::validation("query descriptor has no table"))
    }

    /// Resolve the table for a model operation: the descriptor may omit it, but must not name a
    /// different one.
    pub(crate) fn table_for(&self, model_table: &'static TableDef) -> OrmResult<&'static TableDef> {
        match self.table {
            None => Ok(model_table),
            Some(t) if t.name == model_table.name => Ok(t),
            Some(t) => Err(OrmError::validation(format!(
                "ambiguous table: query descriptor targets \"{}\" but the model maps \"{}\"",
                t.name, model_table.name
            ))),
        }
    }

    /// Check the rendered SQL against the expected list, if any.
    pub(crate) fn verify_sql(&self, sql: &str) -> OrmResult<()> {
        if self.check_sql.is_empty() || self.check_sql.iter().any(|s| s == sql) {
            return Ok(());
        }
        Err(OrmError::SqlMismatch {
            expected: self.check_sql.clone(),
            actual: sql.to_string(),
        })
    }

    pub(crate) fn insert_params(&self) -> impl Iterator<Item = (&Column, &Param)> {
        self.insert.iter().map(|p| (&p.column, &p.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static USER: TableDef = TableDef::new("user").soft_delete("deleted_at");
    static ADDRESS: TableDef = TableDef::new("user_address");

    #[test]
    fn table_resolution_rejects_mismatch() {
        assert_eq!(Qb::new().table_for(&USER).unwrap().name, "user");
        assert_eq!(Qb::new().table_def(&USER).table_for(&USER).unwrap().name, "user");
        let err = Qb::new().table_def(&ADDRESS).table_for(&USER).unwrap_err();
        assert!(err.to_string().contains("ambiguous table"));
    }

    #[test]
    fn missing_table_is_validation_error() {
        assert!(matches!(
            Qb::new().require_table(),
            Err(OrmError::Validation(_))
        ));
    }

    #[test]
    fn verify_sql_accepts_any_listed_statement() {
        let qb = Qb::new().check_sql(["SELECT 1", "SELECT 2"]);
        assert!(qb.verify_sql("SELECT 2").is_ok());
        assert!(matches!(
            qb.verify_sql("SELECT 3"),
            Err(OrmError::SqlMismatch { .. })
        ));
        assert!(Qb::new().verify_sql("anything").is_ok());
    }

    #[test]
    fn builder_accumulates_in_call_order() {
        let qb = Qb::new()
            .table_def(&USER)
            .select(["id", "name"])
            .value("name", "a")
            .value("age", 18)
            .desc("created_at")
            .asc("name");
        assert_eq!(qb.select, vec![Column::new("id"), Column::new("name")]);
        let cols: Vec<_> = qb.insert_params().map(|(c, _)| c.as_str()).collect();
        assert_eq!(cols, ["name", "age"]);
        assert_eq!(qb.order_by[0].direction, Direction::Desc);
        assert_eq!(qb.order_by[1].column.as_str(), "name");
    }

    #[test]
    fn statement_kind_labels() {
        assert_eq!(StatementKind::HardDelete.to_string(), "DELETE");
        assert_eq!(StatementKind::SoftDelete.to_string(), "soft DELETE");
        assert_eq!(StatementKind::Raw.to_string(), "raw statement");
    }
}
