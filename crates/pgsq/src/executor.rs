//! Statement execution over any [`GenericClient`].
//!
//! Every operation follows the same path: render the descriptor, check it against the
//! descriptor's expected SQL (if any), log it, run it under the statement timeout, and decode
//! the rows.

use crate::client::GenericClient;
use crate::column::{Column, Update};
use crate::condition::Op;
use crate::config::Config;
use crate::dialect::Placeholder;
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::param::Param;
use crate::qb::{Qb, StatementKind};
use crate::relation::{Relation, decode_relation};
use crate::render::{self, BuiltQuery};
use crate::row::{FromRow, RowView};
use chrono::Utc;
use std::future::Future;
use tokio_postgres::Row;
use tokio_postgres::types::FromSql;

/// Runs descriptors against one client.
///
/// ```ignore
/// let exec = Executor::new(&client, &config);
/// let n = exec.count(Qb::table::<TableUser>().and("name", Op::equal("A"))).await?;
/// ```
pub struct Executor<'a, C: GenericClient> {
    client: &'a C,
    config: &'a Config,
}

impl<'a, C: GenericClient> Executor<'a, C> {
    pub fn new(client: &'a C, config: &'a Config) -> Self {
        Self { client, config }
    }

    // ==================== Writes ====================

    /// INSERT from the descriptor's insert pairs. Returns the affected row count.
    pub async fn insert(&self, qb: Qb) -> OrmResult<u64> {
        let built = render::render_insert(&self.config.dialect, &qb)?;
        self.execute(Some(&qb), StatementKind::Insert, built).await
    }

    /// INSERT a whole model with lifecycle timestamps set to now; returns the stored row.
    pub async fn insert_model<M: Model>(&self, model: &M) -> OrmResult<M> {
        let built =
            render::render_insert_model(&self.config.dialect, model, M::table(), Utc::now())?;
        let row = self
            .fetch_opt(None, StatementKind::Insert, built)
            .await?
            .ok_or_else(|| OrmError::other("INSERT ... RETURNING produced no row"))?;
        M::decode(&RowView::new(&row))
    }

    pub async fn update(&self, qb: Qb) -> OrmResult<u64> {
        let built = render::render_update(&self.config.dialect, &qb, Utc::now())?;
        self.execute(Some(&qb), StatementKind::Update, built).await
    }

    /// UPDATE the row identified by the model's primary key.
    ///
    /// With an empty `sets` list every mapped column except the primary key, generated
    /// columns and table-managed columns is written from the model.
    pub async fn update_model<M: Model>(
        &self,
        model: &M,
        sets: impl IntoIterator<Item = Update>,
    ) -> OrmResult<u64> {
        let mut sets: Vec<Update> = sets.into_iter().collect();
        if sets.is_empty() {
            let table = M::table();
            sets = M::columns()
                .iter()
                .zip(model.values())
                .filter(|(def, _)| {
                    !def.primary_key && def.insertable && !table.is_managed(def.name)
                })
                .map(|(def, value)| Update {
                    column: Column::new(def.name),
                    value,
                })
                .collect();
        }
        let qb = by_primary_key(model)?.update(sets);
        self.update(qb).await
    }

    pub async fn soft_delete(&self, qb: Qb) -> OrmResult<u64> {
        let built = render::render_soft_delete(&self.config.dialect, &qb, Utc::now())?;
        self.execute(Some(&qb), StatementKind::SoftDelete, built).await
    }

    pub async fn soft_delete_model<M: Model>(&self, model: &M) -> OrmResult<u64> {
        self.soft_delete(by_primary_key(model)?).await
    }

    pub async fn hard_delete(&self, qb: Qb) -> OrmResult<u64> {
        let built = render::render_hard_delete(&self.config.dialect, &qb)?;
        self.execute(Some(&qb), StatementKind::HardDelete, built).await
    }

    pub async fn hard_delete_model<M: Model>(&self, model: &M) -> OrmResult<u64> {
        self.hard_delete(by_primary_key(model)?).await
    }

    /// Run a mutating statement chosen at runtime.
    pub async fn exec_qb(&self, qb: Qb, kind: StatementKind) -> OrmResult<u64> {
        let built = render::render(&self.config.dialect, &qb, kind, Utc::now())?;
        self.execute(Some(&qb), kind, built).await
    }

    /// Run a raw statement with bound parameters. Returns the affected row count.
    ///
    /// The text is sent as given: no soft-delete filter, no empty-WHERE guard.
    pub async fn exec(&self, sql: &str, params: &[Param]) -> OrmResult<u64> {
        let built = BuiltQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        };
        self.execute(None, StatementKind::Raw, built).await
    }

    // ==================== Reads ====================

    /// Fetch one model. `None` when nothing matches.
    pub async fn query_one<M: Model>(&self, qb: Qb) -> OrmResult<Option<M>> {
        let table = qb.table_for(M::table())?;
        let built =
            render::render_select(&self.config.dialect, &qb, table, &M::column_names(), true)?;
        let row = self.fetch_opt(Some(&qb), StatementKind::Select, built).await?;
        row.map(|row| M::decode(&RowView::new(&row))).transpose()
    }

    /// Fetch every matching model.
    pub async fn query_all<M: Model>(&self, qb: Qb) -> OrmResult<Vec<M>> {
        let table = qb.table_for(M::table())?;
        let built =
            render::render_select(&self.config.dialect, &qb, table, &M::column_names(), false)?;
        let rows = self.fetch_all(Some(&qb), StatementKind::Select, built).await?;
        rows.iter().map(|row| M::decode(&RowView::new(row))).collect()
    }

    /// Fetch the first row of an explicit projection, decoded positionally.
    pub async fn query_row<T: FromRow>(&self, qb: Qb) -> OrmResult<Option<T>> {
        let table = qb.require_table()?;
        let built = render::render_select(&self.config.dialect, &qb, table, &[], true)?;
        let row = self.fetch_opt(Some(&qb), StatementKind::Select, built).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Run an explicit projection and hand each row to `f`, stopping at the first error.
    pub async fn query_each<F>(&self, qb: Qb, mut f: F) -> OrmResult<()>
    where
        F: FnMut(&Row) -> OrmResult<()>,
    {
        let table = qb.require_table()?;
        let built = render::render_select(&self.config.dialect, &qb, table, &[], false)?;
        for row in self.fetch_all(Some(&qb), StatementKind::Select, built).await? {
            f(&row)?;
        }
        Ok(())
    }

    pub async fn count(&self, qb: Qb) -> OrmResult<u64> {
        let built = render::render_count(&self.config.dialect, &qb)?;
        let row = self
            .fetch_opt(Some(&qb), StatementKind::Count, built)
            .await?
            .ok_or_else(|| OrmError::other("COUNT(*) returned no row"))?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| OrmError::decode("count", e.to_string()))?;
        Ok(count as u64)
    }

    /// `SUM(column)`. `None` when no row matches, as opposed to `Some(0)`.
    ///
    /// `T` must match the backend's SUM result type. PostgreSQL sums `int2`/`int4` as `int8`
    /// (`i64`), `int8` and `numeric` as `numeric` ([`Decimal`](rust_decimal::Decimal)), and
    /// `float8` as `float8` (`f64`).
    pub async fn sum<T>(&self, column: impl Into<Column>, qb: Qb) -> OrmResult<Option<T>>
    where
        T: for<'r> FromSql<'r>,
    {
        let built = render::render_sum(&self.config.dialect, &qb, &column.into())?;
        let row = self.fetch_opt(Some(&qb), StatementKind::Sum, built).await?;
        match row {
            Some(row) => row
                .try_get::<_, Option<T>>(0)
                .map_err(|e| OrmError::decode("sum", e.to_string())),
            None => Ok(None),
        }
    }

    /// Whether any row matches.
    pub async fn has(&self, qb: Qb) -> OrmResult<bool> {
        let built = render::render_has(&self.config.dialect, &qb)?;
        let row = self.fetch_opt(Some(&qb), StatementKind::Has, built).await?;
        Ok(row.is_some())
    }

    /// Fetch one LEFT JOINed record.
    pub async fn query_relation<R: Relation>(&self, qb: Qb) -> OrmResult<Option<R>> {
        let built = render::render_relation::<R>(&self.config.dialect, &qb, true)?;
        let row = self
            .fetch_opt(Some(&qb), StatementKind::Relation, built)
            .await?;
        row.as_ref().map(decode_relation::<R>).transpose()
    }

    pub async fn query_relation_all<R: Relation>(&self, qb: Qb) -> OrmResult<Vec<R>> {
        let built = render::render_relation::<R>(&self.config.dialect, &qb, false)?;
        let rows = self
            .fetch_all(Some(&qb), StatementKind::Relation, built)
            .await?;
        rows.iter().map(decode_relation::<R>).collect()
    }

    // ==================== Plumbing ====================

    /// Checks shared by every statement before it is sent.
    fn prepare(
        &self,
        qb: Option<&Qb>,
        kind: StatementKind,
        built: &BuiltQuery,
    ) -> OrmResult<()> {
        if self.config.dialect.placeholder != Placeholder::Numbered {
            return Err(OrmError::validation(
                "only numbered-placeholder SQL can be executed on PostgreSQL",
            ));
        }
        if let Some(qb) = qb {
            qb.verify_sql(&built.sql)?;
        }
        self.config.sql_log.emit(kind, built);
        Ok(())
    }

    async fn execute(
        &self,
        qb: Option<&Qb>,
        kind: StatementKind,
        built: BuiltQuery,
    ) -> OrmResult<u64> {
        self.prepare(qb, kind, &built)?;
        let params = built.params_ref();
        self.timed(self.client.execute(&built.sql, &params)).await
    }

    async fn fetch_all(
        &self,
        qb: Option<&Qb>,
        kind: StatementKind,
        built: BuiltQuery,
    ) -> OrmResult<Vec<Row>> {
        self.prepare(qb, kind, &built)?;
        let params = built.params_ref();
        self.timed(self.client.query(&built.sql, &params)).await
    }

    async fn fetch_opt(
        &self,
        qb: Option<&Qb>,
        kind: StatementKind,
        built: BuiltQuery,
    ) -> OrmResult<Option<Row>> {
        self.prepare(qb, kind, &built)?;
        let params = built.params_ref();
        self.timed(self.client.query_opt(&built.sql, &params)).await
    }

    /// Apply the statement timeout, cancelling the server-side statement on expiry.
    async fn timed<T>(&self, fut: impl Future<Output = OrmResult<T>>) -> OrmResult<T> {
        let Some(limit) = self.config.statement_timeout else {
            return fut.await;
        };
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                if let Some(token) = self.client.cancel_token() {
                    if let Err(e) = token.cancel_query(tokio_postgres::NoTls).await {
                        tracing::warn!(
                            target: "pgsq",
                            error = %e,
                            "failed to cancel timed-out statement"
                        );
                    }
                }
                Err(OrmError::Timeout(limit))
            }
        }
    }
}

/// A descriptor matching exactly the model's row.
fn by_primary_key<M: Model>(model: &M) -> OrmResult<Qb> {
    let (column, value) = model.primary_key()?;
    Ok(Qb::table::<M>().and(column, Op::Equal(value)))
}
