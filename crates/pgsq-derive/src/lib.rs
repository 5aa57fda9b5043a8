//! Derive macros for pgsq
//!
//! Provides `#[derive(Table)]` and `#[derive(Model)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod model;
mod table;

/// Derive `DescribesTable` for a table marker type.
///
/// # Example
///
/// ```ignore
/// use pgsq::Table;
///
/// #[derive(Table)]
/// #[sq(table = "user", soft_delete, timestamps)]
/// struct TableUser;
/// ```
///
/// # Attributes
///
/// - `#[sq(table = "name")]` - Table name (required)
/// - `#[sq(soft_delete)]` / `#[sq(soft_delete = "col")]` - Soft-delete column (`deleted_at`)
/// - `#[sq(timestamps)]` - Lifecycle columns `created_at` and `updated_at`
/// - `#[sq(created_at = "col", updated_at = "col")]` - Lifecycle columns, individually named
#[proc_macro_derive(Table, attributes(sq))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    table::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Model` (and `DescribesTable`, `FromRow`) for a struct.
///
/// # Example
///
/// ```ignore
/// use pgsq::Model;
///
/// #[derive(Model)]
/// #[sq(table_of = TableUser)]
/// struct User {
///     #[sq(pk)]
///     id: String,
///     #[sq(column = "full_name")]
///     name: String,
///     #[sq(skip)]
///     cached_label: String,
/// }
/// ```
///
/// # Generated
///
/// - `impl DescribesTable`, `impl Model`, `impl FromRow`
/// - `COL_*: Column` - One constant per mapped field
///
/// Mapped field types implement `Default`: a column an explicit projection leaves out
/// decodes as the default value.
///
/// # Attributes
///
/// - `#[sq(table = "name", ...)]` - Table and conventions, as for `Table`
/// - `#[sq(table_of = Type)]` - Reuse the table of a `DescribesTable` type
/// - `#[sq(pk)]` - Primary key field
/// - `#[sq(column = "name")]` - Map field to a different column name
/// - `#[sq(generated)]` - Database-generated; read but never inserted
/// - `#[sq(skip)]` - Not mapped; filled with `Default::default()`
#[proc_macro_derive(Model, attributes(sq))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
