//! User persistence for tokengate.
//!
//! - [`store::UserStore`] -- the narrow interface the auth flows depend on.
//! - [`repositories::PgUserStore`] -- Postgres implementation.
//! - [`repositories::MemoryUserStore`] -- in-process implementation for tests
//!   and local runs.
//! - [`store::TimeoutStore`] -- bounds every call of another store.

pub mod error;
pub mod models;
pub mod repositories;
pub mod store;

use sqlx::postgres::PgPoolOptions;

pub use error::{StoreError, StoreResult};
pub use store::{TimeoutStore, UserStore};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
