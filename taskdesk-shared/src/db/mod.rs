/// PostgreSQL storage gateway
///
/// # Modules
///
/// - `pool`: Connection pool setup and shutdown
/// - `migrations`: Embedded schema migrations
/// - `scope`: Soft-delete aware query builders
/// - `employees`, `sessions`, `tasks`, `time_entries`: [`PgStore`] trait impls
///
/// # Example
///
/// ```no_run
/// use taskdesk_shared::db::{migrations::run_migrations, pool::{create_pool, PoolConfig}, PgStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(PoolConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
/// run_migrations(&pool).await?;
///
/// let store = PgStore::new(pool);
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pool;
pub mod scope;

mod employees;
mod sessions;
mod tasks;
mod time_entries;

use crate::store::StoreResult;
use scope::Live;
use sqlx::postgres::{PgPool, PgRow};

/// Storage gateway over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn fetch_optional<T>(pool: &PgPool, scope: Live<'_>) -> StoreResult<Option<T>>
where
    T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
{
    let mut builder = scope.into_builder();
    Ok(builder.build_query_as::<T>().fetch_optional(pool).await?)
}

async fn fetch_all<T>(pool: &PgPool, scope: Live<'_>) -> StoreResult<Vec<T>>
where
    T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
{
    let mut builder = scope.into_builder();
    Ok(builder.build_query_as::<T>().fetch_all(pool).await?)
}
