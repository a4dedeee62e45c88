//! Connection pool and blocking-task helpers shared by the `PostgreSQL`
//! adapters.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

/// `PostgreSQL` connection pool type for catalog adapters.
pub type RegistryPgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a connection pool for `database_url`.
///
/// # Errors
///
/// Returns [`PoolError`] when the initial connections cannot be opened.
pub fn build_pool(database_url: &str, max_size: u32) -> Result<RegistryPgPool, PoolError> {
    Pool::builder()
        .max_size(max_size)
        .build(ConnectionManager::<PgConnection>::new(database_url))
}

/// Failure to reach a connection or to join the blocking task.
#[derive(Debug, Error)]
pub(super) enum ConnectionFailure {
    /// No pooled connection was available.
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),

    /// The blocking task panicked or was cancelled.
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs `operation` with a pooled connection on the blocking thread pool.
///
/// Pool and join failures are mapped through `wrap` into the caller's
/// error type.
pub(super) async fn run_blocking<F, T, E, W>(
    pool: &RegistryPgPool,
    wrap: W,
    operation: F,
) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    W: Fn(ConnectionFailure) -> E + Send + Copy + 'static,
{
    let shared_pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = shared_pool
            .get()
            .map_err(|err| wrap(ConnectionFailure::from(err)))?;
        operation(&mut connection)
    })
    .await
    .map_err(|err| wrap(ConnectionFailure::from(err)))?
}
