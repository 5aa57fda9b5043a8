use super::{BuiltQuery, SqlWriter, soft_delete_filters, write_limit, write_order_by, write_where};
use crate::column::Column;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::qb::Qb;
use crate::relation::Relation;
use crate::table::{DescribesTable, TableDef};

/// Render a SELECT.
///
/// The projection is the descriptor's explicit list, or `default_projection` (the destination
/// model's columns) when that list is empty. `single` fetches are limited to one row;
/// otherwise the descriptor's own limit applies.
pub fn render_select(
    dialect: &Dialect,
    qb: &Qb,
    table: &TableDef,
    default_projection: &[Column],
    single: bool,
) -> OrmResult<BuiltQuery> {
    let projection = if qb.select.is_empty() {
        default_projection
    } else {
        qb.select.as_slice()
    };
    if projection.is_empty() {
        return Err(OrmError::validation(format!(
            "SELECT on \"{}\" has no columns to project",
            table.name
        )));
    }

    let mut w = SqlWriter::new(dialect);
    w.push("SELECT ");
    w.push_ident_list(projection.iter().map(Column::as_str))?;
    w.push(" FROM ");
    w.push_ident(table.name)?;
    write_where(&mut w, &qb.filter, &soft_delete_filters(&[table], qb, false))?;
    write_order_by(&mut w, &qb.order_by)?;
    write_limit(&mut w, if single { Some(1) } else { qb.limit });
    Ok(w.finish())
}

/// `SELECT COUNT(*) FROM ...`; ordering and limit do not apply.
pub fn render_count(dialect: &Dialect, qb: &Qb) -> OrmResult<BuiltQuery> {
    let table = qb.require_table()?;
    let mut w = SqlWriter::new(dialect);
    w.push("SELECT COUNT(*) FROM ");
    w.push_ident(table.name)?;
    write_where(&mut w, &qb.filter, &soft_delete_filters(&[table], qb, false))?;
    Ok(w.finish())
}

/// `SELECT SUM(column) FROM ...`; ordering and limit do not apply to a single aggregate row.
pub fn render_sum(dialect: &Dialect, qb: &Qb, column: &Column) -> OrmResult<BuiltQuery> {
    let table = qb.require_table()?;
    let mut w = SqlWriter::new(dialect);
    w.push("SELECT SUM(");
    w.push_ident(column.as_str())?;
    w.push(") FROM ");
    w.push_ident(table.name)?;
    write_where(&mut w, &qb.filter, &soft_delete_filters(&[table], qb, false))?;
    Ok(w.finish())
}

/// Existence probe: `SELECT 1 FROM ... LIMIT 1`.
pub fn render_has(dialect: &Dialect, qb: &Qb) -> OrmResult<BuiltQuery> {
    let table = qb.require_table()?;
    let mut w = SqlWriter::new(dialect);
    w.push("SELECT 1 FROM ");
    w.push_ident(table.name)?;
    write_where(&mut w, &qb.filter, &soft_delete_filters(&[table], qb, false))?;
    write_limit(&mut w, Some(1));
    Ok(w.finish())
}

/// Render the LEFT JOIN select for relation `R`.
///
/// Every column of both tables is projected as `"table"."column" AS "table.column"`, and each
/// table contributes its own soft-delete filter.
pub fn render_relation<R: Relation>(
    dialect: &Dialect,
    qb: &Qb,
    single: bool,
) -> OrmResult<BuiltQuery> {
    let main = qb.table_for(R::Main::table())?;
    let join = R::Join::table();
    if !qb.select.is_empty() {
        return Err(OrmError::validation(
            "relation queries project both tables themselves; remove the explicit select",
        ));
    }

    let mut w = SqlWriter::new(dialect);
    w.push("SELECT ");
    let projection = R::Main::columns()
        .iter()
        .map(|c| (main.name, c.name))
        .chain(R::Join::columns().iter().map(|c| (join.name, c.name)));
    for (i, (table, column)) in projection.enumerate() {
        if i > 0 {
            w.push(", ");
        }
        let qualified = format!("{table}.{column}");
        w.push_ident(&qualified)?;
        w.push(" AS ");
        w.push_alias(&qualified)?;
    }

    let (main_on, join_on) = R::on();
    w.push(" FROM ");
    w.push_ident(main.name)?;
    w.push(" LEFT JOIN ");
    w.push_ident(join.name)?;
    w.push(" ON ");
    w.push_ident(&format!("{}.{}", main.name, main_on))?;
    w.push(" = ");
    w.push_ident(&format!("{}.{}", join.name, join_on))?;

    write_where(&mut w, &qb.filter, &soft_delete_filters(&[main, join], qb, true))?;
    write_order_by(&mut w, &qb.order_by)?;
    write_limit(&mut w, if single { Some(1) } else { qb.limit });
    Ok(w.finish())
}
