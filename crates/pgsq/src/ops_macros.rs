/// Generate the executor operation set for a type that leases a connection per call.
///
/// The implementing type provides:
/// - `async fn lease(&self) -> OrmResult<L>` where `&L` is a [`GenericClient`](crate::GenericClient),
/// - `fn config(&self) -> &Config`,
/// - `fn observe<T>(&self, result: OrmResult<T>) -> OrmResult<T>`, called with every result.
///
/// Usage:
/// ```ignore
/// impl Database {
///     impl_session_ops!();
/// }
/// ```
macro_rules! impl_session_ops {
    () => {
        impl_session_ops! {
            /// INSERT from the descriptor's insert pairs. Returns the affected row count.
            insert(qb: $crate::qb::Qb) -> u64;
            /// UPDATE from the descriptor's SET pairs.
            update(qb: $crate::qb::Qb) -> u64;
            /// Soft delete: set the table's soft-delete column on matching rows.
            soft_delete(qb: $crate::qb::Qb) -> u64;
            /// Physical DELETE.
            hard_delete(qb: $crate::qb::Qb) -> u64;
            /// Run a mutating statement chosen at runtime.
            exec_qb(qb: $crate::qb::Qb, kind: $crate::qb::StatementKind) -> u64;
            /// Run a raw statement with bound parameters.
            exec(sql: &str, params: &[$crate::param::Param]) -> u64;
            /// Count matching rows.
            count(qb: $crate::qb::Qb) -> u64;
            /// Whether any row matches.
            has(qb: $crate::qb::Qb) -> bool;
        }

        /// Insert a whole model; returns the stored row.
        pub async fn insert_model<M: $crate::model::Model>(
            &self,
            model: &M,
        ) -> $crate::error::OrmResult<M> {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .insert_model(model)
                .await;
            self.observe(result)
        }

        /// UPDATE the row identified by the model's primary key.
        pub async fn update_model<M: $crate::model::Model>(
            &self,
            model: &M,
            sets: impl IntoIterator<Item = $crate::column::Update>,
        ) -> $crate::error::OrmResult<u64> {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .update_model(model, sets)
                .await;
            self.observe(result)
        }

        pub async fn soft_delete_model<M: $crate::model::Model>(
            &self,
            model: &M,
        ) -> $crate::error::OrmResult<u64> {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .soft_delete_model(model)
                .await;
            self.observe(result)
        }

        pub async fn hard_delete_model<M: $crate::model::Model>(
            &self,
            model: &M,
        ) -> $crate::error::OrmResult<u64> {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .hard_delete_model(model)
                .await;
            self.observe(result)
        }

        /// Fetch one model. `None` when nothing matches.
        pub async fn query_one<M: $crate::model::Model>(
            &self,
            qb: $crate::qb::Qb,
        ) -> $crate::error::OrmResult<Option<M>> {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .query_one(qb)
                .await;
            self.observe(result)
        }

        /// Fetch every matching model.
        pub async fn query_all<M: $crate::model::Model>(
            &self,
            qb: $crate::qb::Qb,
        ) -> $crate::error::OrmResult<Vec<M>> {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .query_all(qb)
                .await;
            self.observe(result)
        }

        /// Fetch the first row of an explicit projection, decoded positionally.
        pub async fn query_row<T: $crate::row::FromRow>(
            &self,
            qb: $crate::qb::Qb,
        ) -> $crate::error::OrmResult<Option<T>> {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .query_row(qb)
                .await;
            self.observe(result)
        }

        /// Hand each row of an explicit projection to `f`.
        pub async fn query_each<F>(&self, qb: $crate::qb::Qb, f: F) -> $crate::error::OrmResult<()>
        where
            F: FnMut(&tokio_postgres::Row) -> $crate::error::OrmResult<()>,
        {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .query_each(qb, f)
                .await;
            self.observe(result)
        }

        /// `SUM(column)`; `None` when no row matches.
        pub async fn sum<T>(
            &self,
            column: impl Into<$crate::column::Column>,
            qb: $crate::qb::Qb,
        ) -> $crate::error::OrmResult<Option<T>>
        where
            T: for<'r> tokio_postgres::types::FromSql<'r>,
        {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .sum(column, qb)
                .await;
            self.observe(result)
        }

        /// Fetch one LEFT JOINed record.
        pub async fn query_relation<R: $crate::relation::Relation>(
            &self,
            qb: $crate::qb::Qb,
        ) -> $crate::error::OrmResult<Option<R>> {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .query_relation(qb)
                .await;
            self.observe(result)
        }

        pub async fn query_relation_all<R: $crate::relation::Relation>(
            &self,
            qb: $crate::qb::Qb,
        ) -> $crate::error::OrmResult<Vec<R>> {
            let lease = self.lease().await?;
            let result = $crate::executor::Executor::new(&lease, self.config())
                .query_relation_all(qb)
                .await;
            self.observe(result)
        }
    };

    // Non-generic operations.
    ($($(#[$doc:meta])* $op:ident($($arg:ident: $ty:ty),*) -> $ret:ty;)+) => {
        $(
            $(#[$doc])*
            pub async fn $op(&self, $($arg: $ty),*) -> $crate::error::OrmResult<$ret> {
                let lease = self.lease().await?;
                let result = $crate::executor::Executor::new(&lease, self.config())
                    .$op($($arg),*)
                    .await;
                self.observe(result)
            }
        )+
    };
}
