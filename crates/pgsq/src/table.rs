//! Table descriptors.

/// Schema conventions for one table: its name, the soft-delete column, and the lifecycle
/// timestamp columns the renderer fills in automatically.
///
/// Descriptors are plain `const` values, usually produced by `#[derive(Table)]` or
/// `#[derive(Model)]`, but they can be written by hand:
///
/// ```ignore
/// static USER: TableDef = TableDef::new("user")
///     .soft_delete("deleted_at")
///     .timestamps("created_at", "updated_at");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    /// Nullable timestamp column marking a row as deleted.
    pub soft_delete: Option<&'static str>,
    pub created_at: Option<&'static str>,
    pub updated_at: Option<&'static str>,
}

impl TableDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            soft_delete: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub const fn soft_delete(mut self, column: &'static str) -> Self {
        self.soft_delete = Some(column);
        self
    }

    pub const fn created_at(mut self, column: &'static str) -> Self {
        self.created_at = Some(column);
        self
    }

    pub const fn updated_at(mut self, column: &'static str) -> Self {
        self.updated_at = Some(column);
        self
    }

    pub const fn timestamps(self, created_at: &'static str, updated_at: &'static str) -> Self {
        self.created_at(created_at).updated_at(updated_at)
    }

    /// Whether `column` is managed by the table conventions rather than by the caller.
    pub(crate) fn is_managed(&self, column: &str) -> bool {
        [self.soft_delete, self.created_at, self.updated_at].contains(&Some(column))
    }
}

/// Associates a type with the table it lives in.
///
/// Implemented by table marker types (`#[derive(Table)]`) and by every
/// [`Model`](crate::Model).
pub trait DescribesTable {
    fn table() -> &'static TableDef;
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: TableDef = TableDef::new("user")
        .soft_delete("deleted_at")
        .timestamps("created_at", "updated_at");

    #[test]
    fn const_builder_sets_conventions() {
        assert_eq!(USER.name, "user");
        assert_eq!(USER.soft_delete, Some("deleted_at"));
        assert_eq!(USER.created_at, Some("created_at"));
        assert_eq!(USER.updated_at, Some("updated_at"));
        assert_eq!(TableDef::new("plain").soft_delete, None);
    }

    #[test]
    fn managed_columns() {
        assert!(USER.is_managed("deleted_at"));
        assert!(USER.is_managed("updated_at"));
        assert!(!USER.is_managed("name"));
    }
}
