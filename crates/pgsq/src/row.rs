//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

/// Trait for converting a database row into a Rust value.
///
/// Models get an implementation from `#[derive(Model)]`; tuples decode positionally, which is
/// what [`query_row`](crate::Executor::query_row) uses for scalar projections.
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning OrmError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| OrmError::decode(column, e.to_string()))
    }
}

macro_rules! impl_from_row_tuple {
    ($($idx:tt => $ty:ident),+) => {
        impl<$($ty),+> FromRow for ($($ty,)+)
        where
            $($ty: for<'a> FromSql<'a>,)+
        {
            fn from_row(row: &Row) -> OrmResult<Self> {
                Ok(($(
                    row.try_get($idx)
                        .map_err(|e| OrmError::decode(stringify!($idx), e.to_string()))?,
                )+))
            }
        }
    };
}

impl_from_row_tuple!(0 => A);
impl_from_row_tuple!(0 => A, 1 => B);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
impl_from_row_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);

/// A row as seen by one mapped record.
///
/// Plain selects address columns by their bare names. Relation selects alias every column as
/// `table.column`; a prefixed view resolves `get("id")` to the `user.id` result column so a
/// model decodes the same way in both cases.
#[derive(Clone, Copy)]
pub struct RowView<'r> {
    row: &'r Row,
    prefix: Option<&'r str>,
}

impl<'r> RowView<'r> {
    pub fn new(row: &'r Row) -> Self {
        Self { row, prefix: None }
    }

    pub fn prefixed(row: &'r Row, prefix: &'r str) -> Self {
        Self {
            row,
            prefix: Some(prefix),
        }
    }

    pub fn row(&self) -> &'r Row {
        self.row
    }

    fn key(&self, column: &str) -> String {
        match self.prefix {
            Some(prefix) => format!("{prefix}.{column}"),
            None => column.to_string(),
        }
    }

    /// Decode `column`, honoring the prefix.
    pub fn get<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.row.try_get_column(&self.key(column))
    }

    /// Whether the result set carries `column`.
    pub fn contains(&self, column: &str) -> bool {
        let key = self.key(column);
        self.row.columns().iter().any(|c| c.name() == key)
    }

    /// Decode `column`, or `T::default()` when an explicit projection left it out.
    pub fn get_or_default<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a> + Default,
    {
        if self.contains(column) {
            self.get(column)
        } else {
            Ok(T::default())
        }
    }

    /// Whether `column` is NULL, regardless of its SQL type.
    pub fn is_null(&self, column: &str) -> OrmResult<bool> {
        let key = self.key(column);
        self.row
            .try_get::<_, Nullness>(key.as_str())
            .map(|n| n.0)
            .map_err(|e| OrmError::decode(key, e.to_string()))
    }
}

/// Accepts any SQL type and only records whether the value was NULL.
struct Nullness(bool);

impl<'a> FromSql<'a> for Nullness {
    fn from_sql(_: &Type, _: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Nullness(false))
    }

    fn from_sql_null(_: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Nullness(true))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}
