//! Convenient imports for typical `pgsq` usage.
//!
//! ```ignore
//! use pgsq::prelude::*;
//! ```

pub use crate::{
    Column, Config, Database, DescribesTable, FromRow, Model, Op, OrmError, OrmResult, Qb,
    Relation, TableDef, TxOutcome, TxReport, Where,
};

#[cfg(feature = "derive")]
pub use crate::Table;
