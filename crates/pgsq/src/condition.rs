//! Composable WHERE predicates.
//!
//! A [`Where`] is an ordered list of conditions joined by `AND`/`OR`, where each entry is either
//! a `(column, operator)` comparison or a nested, parenthesized group. Rendering walks the list
//! left to right, so bound values appear in exactly the order the conditions were composed.
//!
//! ```ignore
//! use pgsq::{and, Op};
//!
//! let w = and("name", Op::like_left("Test"))
//!     .and("age", Op::gte(18))
//!     .or_group(and("role", Op::equal("admin")));
//! // "name" LIKE $1 AND "age" >= $2 OR ("role" = $3)
//! ```

use crate::column::Column;
use crate::error::OrmResult;
use crate::param::Param;
use crate::render::SqlWriter;
use tokio_postgres::types::ToSql;

/// Comparison operator together with its bound value(s).
///
/// Pattern operators own the caller's string and add the wildcard themselves, so
/// `LikeLeft("Te")` binds `"Te%"`.
#[derive(Debug, Clone)]
pub enum Op {
    Equal(Param),
    NotEqual(Param),
    Gt(Param),
    Gte(Param),
    Lt(Param),
    Lte(Param),
    /// Substring match: binds `%v%`.
    Like(String),
    /// Prefix match: binds `v%`.
    LikeLeft(String),
    /// Suffix match: binds `%v`.
    LikeRight(String),
    /// Negated substring match: binds `%v%`.
    NotLike(String),
    In(Vec<Param>),
    NotIn(Vec<Param>),
    Between(Param, Param),
    IsNull,
    IsNotNull,
}

impl Op {
    pub fn equal<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Op::Equal(Param::new(value))
    }

    pub fn not_equal<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Op::NotEqual(Param::new(value))
    }

    pub fn gt<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Op::Gt(Param::new(value))
    }

    pub fn gte<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Op::Gte(Param::new(value))
    }

    pub fn lt<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Op::Lt(Param::new(value))
    }

    pub fn lte<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Op::Lte(Param::new(value))
    }

    pub fn like(pattern: impl Into<String>) -> Self {
        Op::Like(pattern.into())
    }

    pub fn like_left(prefix: impl Into<String>) -> Self {
        Op::LikeLeft(prefix.into())
    }

    pub fn like_right(suffix: impl Into<String>) -> Self {
        Op::LikeRight(suffix.into())
    }

    pub fn not_like(pattern: impl Into<String>) -> Self {
        Op::NotLike(pattern.into())
    }

    pub fn in_list<T: ToSql + Send + Sync + 'static>(values: impl IntoIterator<Item = T>) -> Self {
        Op::In(values.into_iter().map(Param::new).collect())
    }

    pub fn not_in<T: ToSql + Send + Sync + 'static>(values: impl IntoIterator<Item = T>) -> Self {
        Op::NotIn(values.into_iter().map(Param::new).collect())
    }

    pub fn between<T: ToSql + Send + Sync + 'static>(low: T, high: T) -> Self {
        Op::Between(Param::new(low), Param::new(high))
    }

    /// SQL keyword placed between the column and its placeholder(s).
    pub fn keyword(&self) -> &'static str {
        match self {
            Op::Equal(_) => "=",
            Op::NotEqual(_) => "<>",
            Op::Gt(_) => ">",
            Op::Gte(_) => ">=",
            Op::Lt(_) => "<",
            Op::Lte(_) => "<=",
            Op::Like(_) | Op::LikeLeft(_) | Op::LikeRight(_) => "LIKE",
            Op::NotLike(_) => "NOT LIKE",
            Op::In(_) => "IN",
            Op::NotIn(_) => "NOT IN",
            Op::Between(_, _) => "BETWEEN",
            Op::IsNull => "IS NULL",
            Op::IsNotNull => "IS NOT NULL",
        }
    }

    /// The bound pattern string for the LIKE family.
    fn pattern(&self) -> Option<String> {
        match self {
            Op::Like(v) | Op::NotLike(v) => Some(format!("%{v}%")),
            Op::LikeLeft(v) => Some(format!("{v}%")),
            Op::LikeRight(v) => Some(format!("%{v}")),
            _ => None,
        }
    }

    fn write(&self, column: &Column, w: &mut SqlWriter<'_>) -> OrmResult<()> {
        match self {
            // Empty lists keep their set semantics instead of producing invalid SQL.
            Op::In(values) if values.is_empty() => {
                w.push("1=0");
                return Ok(());
            }
            Op::NotIn(values) if values.is_empty() => {
                w.push("1=1");
                return Ok(());
            }
            _ => {}
        }

        w.push_ident(column.as_str())?;
        w.push(" ");
        w.push(self.keyword());
        match self {
            Op::Equal(v) | Op::NotEqual(v) | Op::Gt(v) | Op::Gte(v) | Op::Lt(v) | Op::Lte(v) => {
                w.push(" ");
                w.push_bind(v.clone());
            }
            Op::Like(_) | Op::LikeLeft(_) | Op::LikeRight(_) | Op::NotLike(_) => {
                w.push(" ");
                w.push_bind(Param::new(self.pattern().unwrap_or_default()));
            }
            Op::In(values) | Op::NotIn(values) => {
                w.push(" (");
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        w.push(", ");
                    }
                    w.push_bind(v.clone());
                }
                w.push(")");
            }
            Op::Between(low, high) => {
                w.push(" ");
                w.push_bind(low.clone());
                w.push(" AND ");
                w.push_bind(high.clone());
            }
            Op::IsNull | Op::IsNotNull => {}
        }
        Ok(())
    }
}

/// How an entry is joined to the entry before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn as_sql(self) -> &'static str {
        match self {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Cond { column: Column, op: Op },
    Group(Where),
}

/// An ordered predicate tree. The combinator of the first entry is ignored.
#[derive(Debug, Clone, Default)]
pub struct Where {
    entries: Vec<(Combinator, Node)>,
}

/// Start a predicate with `column <op>`.
pub fn and(column: impl Into<Column>, op: Op) -> Where {
    Where::new().and(column, op)
}

/// Start a predicate with `column <op>`; the same as [`and`] for a first entry, provided for
/// symmetry when composing groups.
pub fn or(column: impl Into<Column>, op: Op) -> Where {
    Where::new().or(column, op)
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, column: impl Into<Column>, op: Op) -> Self {
        self.push(Combinator::And, column.into(), op);
        self
    }

    pub fn or(mut self, column: impl Into<Column>, op: Op) -> Self {
        self.push(Combinator::Or, column.into(), op);
        self
    }

    /// Append a parenthesized sub-predicate joined with `AND`.
    pub fn and_group(mut self, group: Where) -> Self {
        self.entries.push((Combinator::And, Node::Group(group)));
        self
    }

    /// Append a parenthesized sub-predicate joined with `OR`.
    pub fn or_group(mut self, group: Where) -> Self {
        self.entries.push((Combinator::Or, Node::Group(group)));
        self
    }

    fn push(&mut self, combinator: Combinator, column: Column, op: Op) {
        self.entries.push((combinator, Node::Cond { column, op }));
    }

    /// True when rendering would produce no SQL at all (nested empty groups count as empty).
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, node)| match node {
            Node::Cond { .. } => false,
            Node::Group(group) => group.is_empty(),
        })
    }

    /// True when an `OR` joins two rendered entries at the top level, i.e. the rendered
    /// predicate must be parenthesized before anything is ANDed onto it.
    pub(crate) fn has_top_level_or(&self) -> bool {
        self.rendered()
            .skip(1)
            .any(|(combinator, _)| *combinator == Combinator::Or)
    }

    fn rendered(&self) -> impl Iterator<Item = &(Combinator, Node)> {
        self.entries.iter().filter(|(_, node)| match node {
            Node::Cond { .. } => true,
            Node::Group(group) => !group.is_empty(),
        })
    }

    pub(crate) fn write(&self, w: &mut SqlWriter<'_>) -> OrmResult<()> {
        for (i, (combinator, node)) in self.rendered().enumerate() {
            if i > 0 {
                w.push(combinator.as_sql());
            }
            match node {
                Node::Cond { column, op } => op.write(column, w)?,
                Node::Group(group) => {
                    w.push("(");
                    group.write(w)?;
                    w.push(")");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn render(w: &Where, dialect: &Dialect) -> (String, usize) {
        let mut writer = SqlWriter::new(dialect);
        w.write(&mut writer).unwrap();
        let built = writer.finish();
        (built.sql, built.params.len())
    }

    #[test]
    fn renders_left_to_right_with_numbered_placeholders() {
        let w = and("name", Op::like_left("Test"))
            .and("age", Op::gte(18))
            .or("role", Op::equal("admin"));
        let (sql, n) = render(&w, &Dialect::POSTGRES);
        assert_eq!(sql, r#""name" LIKE $1 AND "age" >= $2 OR "role" = $3"#);
        assert_eq!(n, 3);
    }

    #[test]
    fn renders_question_marks_and_backticks() {
        let w = and(Column::qualified("user", "name"), Op::equal("x"));
        let (sql, _) = render(&w, &Dialect::MYSQL);
        assert_eq!(sql, "`user`.`name` = ?");
    }

    #[test]
    fn nested_groups_are_parenthesized() {
        let w = and("status", Op::equal("active")).and_group(
            or("role", Op::equal("admin"))
                .or_group(and("role", Op::equal("user")).and("reputation", Op::gt(100))),
        );
        let (sql, n) = render(&w, &Dialect::POSTGRES);
        assert_eq!(
            sql,
            r#""status" = $1 AND ("role" = $2 OR ("role" = $3 AND "reputation" > $4))"#
        );
        assert_eq!(n, 4);
    }

    #[test]
    fn like_family_formats_the_bound_pattern() {
        assert_eq!(Op::like("es").pattern().as_deref(), Some("%es%"));
        assert_eq!(Op::like_left("Te").pattern().as_deref(), Some("Te%"));
        assert_eq!(Op::like_right("st").pattern().as_deref(), Some("%st"));
        assert_eq!(Op::equal(1).pattern(), None);
    }

    #[test]
    fn empty_in_lists_keep_set_semantics() {
        let (sql, n) = render(&and("id", Op::in_list(Vec::<i64>::new())), &Dialect::POSTGRES);
        assert_eq!((sql.as_str(), n), ("1=0", 0));
        let (sql, _) = render(&and("id", Op::not_in(Vec::<i64>::new())), &Dialect::POSTGRES);
        assert_eq!(sql, "1=1");
        let (sql, n) = render(&and("id", Op::in_list([1i64, 2, 3])), &Dialect::POSTGRES);
        assert_eq!(sql, r#""id" IN ($1, $2, $3)"#);
        assert_eq!(n, 3);
    }

    #[test]
    fn between_and_null_checks() {
        let w = and("age", Op::between(18, 30)).and("deleted_at", Op::IsNull);
        let (sql, n) = render(&w, &Dialect::POSTGRES);
        assert_eq!(sql, r#""age" BETWEEN $1 AND $2 AND "deleted_at" IS NULL"#);
        assert_eq!(n, 2);
    }

    #[test]
    fn emptiness_ignores_empty_groups() {
        assert!(Where::new().is_empty());
        assert!(Where::new().and_group(Where::new()).is_empty());
        assert!(!and("id", Op::equal(1)).is_empty());

        let w = Where::new().or_group(Where::new()).and("id", Op::equal(1));
        let (sql, _) = render(&w, &Dialect::POSTGRES);
        assert_eq!(sql, r#""id" = $1"#);
        assert!(!w.has_top_level_or());
    }

    #[test]
    fn detects_top_level_or() {
        assert!(and("a", Op::equal(1)).or("b", Op::equal(2)).has_top_level_or());
        assert!(!and("a", Op::equal(1))
            .and_group(or("b", Op::equal(2)).or("c", Op::equal(3)))
            .has_top_level_or());
        // A leading OR has nothing to its left.
        assert!(!or("a", Op::equal(1)).has_top_level_or());
    }
}
