//! PostgreSQL access for the goal-tracking schema.
//!
//! - [`migrations`]: the ordered, idempotent migration set and its tooling
//! - [`models`] / [`repositories`]: typed rows and SQL for each table
//! - [`error`]: migration errors and constraint-violation classification

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod migrations;
pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Default pool size; migrations run sequentially so a handful is plenty.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migration set with default options (optional
/// migrations skipped, already-applied migrations left alone).
pub async fn run_migrations(
    pool: &DbPool,
) -> Result<migrations::MigrationReport, error::MigrationError> {
    let set = migrations::MigrationSet::embedded();
    migrations::run(pool, &set, &migrations::MigrationOptions::default()).await
}
