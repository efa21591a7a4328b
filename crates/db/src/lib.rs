//! PostgreSQL persistence for Boothline.
//!
//! - [`PgQueueStore`] implements the engine's storage traits.
//! - [`repositories`] hold the SQL, one unit struct per table.
//! - [`retry`] reruns operations that hit transient conflicts.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod pg_store;
pub mod repositories;
pub mod retry;

pub use pg_store::PgQueueStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// Apply any pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
