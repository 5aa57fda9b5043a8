//! SQL rendering.
//!
//! Turns a [`Qb`] plus a [`StatementKind`] into SQL text and an ordered parameter list.
//! Rendering is pure: the same descriptor always yields the same text, which is what the
//! golden tests in `render/tests.rs` rely on. Identifiers are quoted for the active
//! [`Dialect`]; values are only ever bound, never spliced into the text.

mod mutate;
mod select;


pub use mutate::{
    render_hard_delete, render_insert, render_insert_model, render_soft_delete, render_update,
};
pub use select::{render_count, render_has, render_relation, render_select, render_sum};

use crate::column::{Column, OrderBy};
use crate::condition::Where;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident;
use crate::param::Param;
use crate::qb::{Qb, StatementKind};
use crate::table::TableDef;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tokio_postgres::types::ToSql;

/// Rendered SQL and its bound parameters.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Param>,
}

impl BuiltQuery {
    /// Borrow the parameters in the shape tokio-postgres expects.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

/// Render a mutating statement.
///
/// `now` fills the lifecycle and soft-delete timestamps.
pub fn render(
    dialect: &Dialect,
    qb: &Qb,
    kind: StatementKind,
    now: DateTime<Utc>,
) -> OrmResult<BuiltQuery> {
    match kind {
        StatementKind::Insert => render_insert(dialect, qb),
        StatementKind::Update => render_update(dialect, qb, now),
        StatementKind::SoftDelete => render_soft_delete(dialect, qb, now),
        StatementKind::HardDelete => render_hard_delete(dialect, qb),
        other => Err(OrmError::validation(format!(
            "{other} is not rendered from a mutating descriptor; use the matching operation"
        ))),
    }
}

/// SQL text accumulator that numbers placeholders as values are bound.
pub(crate) struct SqlWriter<'d> {
    dialect: &'d Dialect,
    sql: String,
    params: Vec<Param>,
}

impl<'d> SqlWriter<'d> {
    pub(crate) fn new(dialect: &'d Dialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(128),
            params: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Append a quoted, possibly table-qualified identifier.
    pub(crate) fn push_ident(&mut self, name: &str) -> OrmResult<()> {
        ident::write_ident(&mut self.sql, name, self.dialect.quote)
    }

    /// Append a quoted alias; dots stay inside the quotes.
    pub(crate) fn push_alias(&mut self, alias: &str) -> OrmResult<()> {
        ident::write_quoted(&mut self.sql, alias, self.dialect.quote)
    }

    pub(crate) fn push_ident_list<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> OrmResult<()> {
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_ident(name)?;
        }
        Ok(())
    }

    pub(crate) fn push_bind(&mut self, param: Param) {
        self.params.push(param);
        self.dialect.write_placeholder(&mut self.sql, self.params.len());
    }

    pub(crate) fn finish(self) -> BuiltQuery {
        BuiltQuery {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Soft-delete columns to filter on, fully qualified when `qualify` is set.
fn soft_delete_filters(tables: &[&TableDef], qb: &Qb, qualify: bool) -> Vec<String> {
    if qb.disable_soft_delete {
        return Vec::new();
    }
    tables
        .iter()
        .filter_map(|t| {
            t.soft_delete.map(|col| {
                if qualify {
                    format!("{}.{}", t.name, col)
                } else {
                    col.to_string()
                }
            })
        })
        .collect()
}

/// Write ` WHERE <filter> AND <soft> IS NULL ...`, or nothing when both are empty.
fn write_where(w: &mut SqlWriter<'_>, filter: &Where, soft_delete: &[String]) -> OrmResult<()> {
    let has_filter = !filter.is_empty();
    if !has_filter && soft_delete.is_empty() {
        return Ok(());
    }

    w.push(" WHERE ");
    if has_filter {
        // `a OR b AND deleted_at IS NULL` would only filter `b`.
        let wrap = !soft_delete.is_empty() && filter.has_top_level_or();
        if wrap {
            w.push("(");
        }
        filter.write(w)?;
        if wrap {
            w.push(")");
        }
    }
    for (i, column) in soft_delete.iter().enumerate() {
        if has_filter || i > 0 {
            w.push(" AND ");
        }
        w.push_ident(column)?;
        w.push(" IS NULL");
    }
    Ok(())
}

fn write_order_by(w: &mut SqlWriter<'_>, order_by: &[OrderBy]) -> OrmResult<()> {
    for (i, item) in order_by.iter().enumerate() {
        w.push(if i == 0 { " ORDER BY " } else { ", " });
        w.push_ident(item.column.as_str())?;
        w.push(" ");
        w.push(item.direction.as_sql());
    }
    Ok(())
}

fn write_limit(w: &mut SqlWriter<'_>, limit: Option<i64>) {
    if let Some(limit) = limit {
        w.push(" LIMIT ");
        w.push_bind(Param::new(limit));
    }
}

/// Reject an empty predicate on UPDATE/DELETE unless the caller opted in.
fn guard_where(qb: &Qb, kind: StatementKind, table: &TableDef) -> OrmResult<()> {
    if qb.filter.is_empty() && !qb.allow_all_rows {
        return Err(OrmError::MissingWhere {
            statement: kind,
            table: table.name.to_string(),
        });
    }
    Ok(())
}

fn ensure_unique<'a>(
    kind: StatementKind,
    columns: impl IntoIterator<Item = &'a Column>,
) -> OrmResult<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(OrmError::validation(format!(
                "{kind} lists column \"{column}\" more than once"
            )));
        }
    }
    Ok(())
}
