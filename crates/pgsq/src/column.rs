//! Column identifiers, ordering and (column, value) pairs.

use crate::param::Param;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tokio_postgres::types::ToSql;

/// A column name, optionally table-qualified (`table.column`).
///
/// Columns carry no type information; equality is by the underlying string.
///
/// ```ignore
/// const NAME: Column = Column::new("name");
/// let qualified = Column::qualified("user", "name"); // "user.name"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Column(Cow<'static, str>);

impl Column {
    pub const fn new(name: &'static str) -> Self {
        Column(Cow::Borrowed(name))
    }

    pub fn qualified(table: &str, column: &str) -> Self {
        Column(Cow::Owned(format!("{table}.{column}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The qualifying table, if any.
    pub fn table(&self) -> Option<&str> {
        self.0.rsplit_once('.').map(|(table, _)| table)
    }

    /// The bare column name without its table qualifier.
    pub fn name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.as_str(), |(_, name)| name)
    }
}

impl From<&'static str> for Column {
    fn from(name: &'static str) -> Self {
        Column::new(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column(Cow::Owned(name))
    }
}

impl From<&Column> for Column {
    fn from(column: &Column) -> Self {
        column.clone()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One ORDER BY item. List order is clause order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub direction: Direction,
}

/// A column/value pair of an INSERT.
#[derive(Debug, Clone)]
pub struct Insert {
    pub column: Column,
    pub value: Param,
}

/// A column/value pair of an UPDATE's SET list.
#[derive(Debug, Clone)]
pub struct Update {
    pub column: Column,
    pub value: Param,
}

/// Build an [`Insert`] pair.
pub fn value<T: ToSql + Send + Sync + 'static>(column: impl Into<Column>, value: T) -> Insert {
    Insert {
        column: column.into(),
        value: Param::new(value),
    }
}

/// Build an [`Update`] pair.
pub fn set<T: ToSql + Send + Sync + 'static>(column: impl Into<Column>, value: T) -> Update {
    Update {
        column: column.into(),
        value: Param::new(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_column_splits_table_and_name() {
        let c = Column::qualified("user_address", "user_id");
        assert_eq!(c.as_str(), "user_address.user_id");
        assert_eq!(c.table(), Some("user_address"));
        assert_eq!(c.name(), "user_id");

        let bare = Column::new("name");
        assert_eq!(bare.table(), None);
        assert_eq!(bare.name(), "name");
    }

    #[test]
    fn equality_is_by_string() {
        assert_eq!(Column::new("id"), Column::from(String::from("id")));
        assert_ne!(Column::new("id"), Column::qualified("user", "id"));
    }
}
