//! deadpool-postgres pool construction.

use crate::error::{OrmError, OrmResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolBuilder, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::Socket;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};

const DEFAULT_MAX_SIZE: usize = 16;

/// Plain-TCP pool with [`DEFAULT_MAX_SIZE`] connections.
///
/// ```ignore
/// let db = pgsq::Database::new(pgsq::create_pool(&url)?, pgsq::Config::default());
/// ```
pub fn create_pool(database_url: &str) -> OrmResult<Pool> {
    create_pool_with_config(database_url, DEFAULT_MAX_SIZE)
}

pub fn create_pool_with_config(database_url: &str, max_size: usize) -> OrmResult<Pool> {
    create_pool_with_manager_config(database_url, NoTls, fast_recycling(), |builder| {
        builder.max_size(max_size)
    })
}

/// Full control over TLS, manager settings and the pool builder.
pub fn create_pool_with_manager_config<T>(
    database_url: &str,
    tls: T,
    manager_config: ManagerConfig,
    configure_pool: impl FnOnce(PoolBuilder) -> PoolBuilder,
) -> OrmResult<Pool>
where
    T: MakeTlsConnect<Socket> + Clone + Sync + Send + 'static,
    T::Stream: Sync + Send,
    T::TlsConnect: Sync + Send,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| OrmError::Connection(e.to_string()))?;

    let manager = Manager::from_config(pg_config, tls, manager_config);
    configure_pool(Pool::builder(manager))
        .build()
        .map_err(|e| OrmError::Pool(e.to_string()))
}

fn fast_recycling() -> ManagerConfig {
    ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    }
}
