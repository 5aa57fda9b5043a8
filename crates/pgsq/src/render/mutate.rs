use super::{
    BuiltQuery, SqlWriter, ensure_unique, guard_where, soft_delete_filters, write_where,
};
use crate::column::Column;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::param::Param;
use crate::qb::{Qb, StatementKind};
use crate::table::TableDef;
use chrono::{DateTime, Utc};

/// `INSERT INTO t (a, b) VALUES ($1, $2)` from the descriptor's insert pairs.
pub fn render_insert(dialect: &Dialect, qb: &Qb) -> OrmResult<BuiltQuery> {
    let table = qb.require_table()?;
    if qb.insert.is_empty() {
        return Err(OrmError::validation(format!(
            "INSERT into \"{}\" has no values",
            table.name
        )));
    }
    ensure_unique(StatementKind::Insert, qb.insert.iter().map(|p| &p.column))?;

    let (columns, values): (Vec<_>, Vec<_>) = qb
        .insert_params()
        .map(|(c, v)| (c.as_str(), v.clone()))
        .unzip();
    write_insert(dialect, table, &columns, values, &[])
}

/// Insert a whole model.
///
/// Writes every insertable column except the ones the table manages itself, adds the
/// created/updated timestamps set to `now`, and returns the stored row.
pub fn render_insert_model<M: Model>(
    dialect: &Dialect,
    model: &M,
    table: &TableDef,
    now: DateTime<Utc>,
) -> OrmResult<BuiltQuery> {
    let defs = M::columns();
    let values = model.values();
    if values.len() != defs.len() {
        return Err(OrmError::validation(format!(
            "model for \"{}\" maps {} columns but produced {} values",
            table.name,
            defs.len(),
            values.len()
        )));
    }

    let mut columns = Vec::with_capacity(defs.len() + 2);
    let mut params = Vec::with_capacity(defs.len() + 2);
    for (def, value) in defs.iter().zip(values) {
        if def.insertable && !table.is_managed(def.name) {
            columns.push(def.name);
            params.push(value);
        }
    }
    for lifecycle in [table.created_at, table.updated_at].into_iter().flatten() {
        columns.push(lifecycle);
        params.push(Param::new(now));
    }

    let returning: Vec<&str> = defs.iter().map(|d| d.name).collect();
    write_insert(dialect, table, &columns, params, &returning)
}

fn write_insert(
    dialect: &Dialect,
    table: &TableDef,
    columns: &[&str],
    values: Vec<Param>,
    returning: &[&str],
) -> OrmResult<BuiltQuery> {
    let mut w = SqlWriter::new(dialect);
    w.push("INSERT INTO ");
    w.push_ident(table.name)?;
    w.push(" (");
    w.push_ident_list(columns.iter().copied())?;
    w.push(") VALUES (");
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.push_bind(value);
    }
    w.push(")");
    if !returning.is_empty() {
        w.push(" RETURNING ");
        w.push_ident_list(returning.iter().copied())?;
    }
    Ok(w.finish())
}

/// `UPDATE t SET ... WHERE ...`.
///
/// The table's updated-at column is set to `now` unless the caller already sets it.
pub fn render_update(dialect: &Dialect, qb: &Qb, now: DateTime<Utc>) -> OrmResult<BuiltQuery> {
    let table = qb.require_table()?;
    if qb.update.is_empty() {
        return Err(OrmError::validation(format!(
            "UPDATE of \"{}\" has no SET values",
            table.name
        )));
    }
    ensure_unique(StatementKind::Update, qb.update.iter().map(|p| &p.column))?;
    guard_where(qb, StatementKind::Update, table)?;

    let mut w = SqlWriter::new(dialect);
    w.push("UPDATE ");
    w.push_ident(table.name)?;
    w.push(" SET ");
    for (i, pair) in qb.update.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        write_assignment(&mut w, &pair.column, pair.value.clone())?;
    }
    if let Some(updated_at) = table.updated_at {
        if !qb.update.iter().any(|p| p.column.name() == updated_at) {
            w.push(", ");
            write_assignment(&mut w, &Column::new(updated_at), Param::new(now))?;
        }
    }
    write_where(&mut w, &qb.filter, &soft_delete_filters(&[table], qb, false))?;
    Ok(w.finish())
}

/// Soft delete: `UPDATE t SET deleted_at = $1 WHERE ... AND deleted_at IS NULL`.
pub fn render_soft_delete(
    dialect: &Dialect,
    qb: &Qb,
    now: DateTime<Utc>,
) -> OrmResult<BuiltQuery> {
    let table = qb.require_table()?;
    let Some(deleted_at) = table.soft_delete else {
        return Err(OrmError::validation(format!(
            "table \"{}\" has no soft-delete column",
            table.name
        )));
    };
    guard_where(qb, StatementKind::SoftDelete, table)?;

    let mut w = SqlWriter::new(dialect);
    w.push("UPDATE ");
    w.push_ident(table.name)?;
    w.push(" SET ");
    write_assignment(&mut w, &Column::new(deleted_at), Param::new(now))?;
    write_where(&mut w, &qb.filter, &soft_delete_filters(&[table], qb, false))?;
    Ok(w.finish())
}

/// Hard delete: a plain `DELETE`, never filtered by soft-delete state.
pub fn render_hard_delete(dialect: &Dialect, qb: &Qb) -> OrmResult<BuiltQuery> {
    let table = qb.require_table()?;
    guard_where(qb, StatementKind::HardDelete, table)?;

    let mut w = SqlWriter::new(dialect);
    w.push("DELETE FROM ");
    w.push_ident(table.name)?;
    write_where(&mut w, &qb.filter, &[])?;
    Ok(w.finish())
}

fn write_assignment(w: &mut SqlWriter<'_>, column: &Column, value: Param) -> OrmResult<()> {
    w.push_ident(column.as_str())?;
    w.push(" = ");
    w.push_bind(value);
    Ok(())
}
