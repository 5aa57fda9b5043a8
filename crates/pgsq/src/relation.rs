//! Two-table LEFT JOIN composition.

use crate::error::OrmResult;
use crate::model::Model;
use crate::row::RowView;
use tokio_postgres::Row;

/// A record assembled from a main table LEFT JOINed with one other table.
///
/// The rendered projection aliases every column as `table.column`; decoding reads each side
/// through a prefixed [`RowView`], and the joined side is `None` when the join found no row.
///
/// ```ignore
/// struct UserWithAddress {
///     user: User,
///     address: Option<UserAddress>,
/// }
///
/// impl Relation for UserWithAddress {
///     type Main = User;
///     type Join = UserAddress;
///
///     fn on() -> (&'static str, &'static str) {
///         ("id", "user_id")
///     }
///
///     fn compose(user: User, address: Option<UserAddress>) -> Self {
///         Self { user, address }
///     }
/// }
/// ```
pub trait Relation: Sized + Send {
    type Main: Model;
    type Join: Model;

    /// Join columns as `(main column, joined column)`, both unqualified.
    fn on() -> (&'static str, &'static str);

    fn compose(main: Self::Main, join: Option<Self::Join>) -> Self;
}

/// Split one joined row into its two sides.
pub(crate) fn decode_relation<R: Relation>(row: &Row) -> OrmResult<R> {
    let main_table = <R::Main as crate::DescribesTable>::table().name;
    let join_table = <R::Join as crate::DescribesTable>::table().name;

    let main = R::Main::decode(&RowView::prefixed(row, main_table))?;

    let join_view = RowView::prefixed(row, join_table);
    let mut matched = false;
    for column in R::Join::columns() {
        if !join_view.is_null(column.name)? {
            matched = true;
            break;
        }
    }
    let join = if matched {
        Some(R::Join::decode(&join_view)?)
    } else {
        None
    };

    Ok(R::compose(main, join))
}
