//! Mapped records.

use crate::column::Column;
use crate::error::{OrmError, OrmResult};
use crate::param::Param;
use crate::row::RowView;
use crate::table::DescribesTable;

/// Static description of one mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub primary_key: bool,
    /// `false` for columns the database generates (serial ids, defaults); they are still
    /// selected and decoded but never written by insert-model.
    pub insertable: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            primary_key: false,
            insertable: true,
        }
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub const fn generated(mut self) -> Self {
        self.insertable = false;
        self
    }
}

/// A record mapped to one table.
///
/// The column table is built once per type (normally by `#[derive(Model)]`), so no field
/// discovery happens at query time. `values` must return one parameter per entry of
/// `columns`, in the same order.
///
/// ```ignore
/// #[derive(Model)]
/// #[sq(table_of = TableUser)]
/// struct User {
///     #[sq(pk)]
///     id: String,
///     name: String,
///     age: i32,
///     created_at: DateTime<Utc>,
///     updated_at: DateTime<Utc>,
/// }
/// ```
pub trait Model: DescribesTable + Sized + Send + Sync {
    fn columns() -> &'static [ColumnDef];

    /// Build a record from a row. Columns an explicit projection omitted are left at their
    /// default.
    fn decode(row: &RowView<'_>) -> OrmResult<Self>;

    fn values(&self) -> Vec<Param>;

    fn column_names() -> Vec<Column> {
        Self::columns().iter().map(|c| Column::new(c.name)).collect()
    }

    /// The primary key column and this record's value for it.
    fn primary_key(&self) -> OrmResult<(Column, Param)> {
        let idx = Self::columns()
            .iter()
            .position(|c| c.primary_key)
            .ok_or_else(|| {
                OrmError::validation(format!(
                    "model for table \"{}\" has no primary key column",
                    Self::table().name
                ))
            })?;
        let value = self.values().into_iter().nth(idx).ok_or_else(|| {
            OrmError::validation(format!(
                "model for table \"{}\" returned fewer values than columns",
                Self::table().name
            ))
        })?;
        Ok((Column::new(Self::columns()[idx].name), value))
    }
}
