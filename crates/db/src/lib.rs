//! Persistence for the AutoBan backend.
//!
//! - Users live in PostgreSQL ([`repositories::PgUserRepo`]).
//! - Device sessions live in Redis ([`repositories::RedisSessionRepo`]) so the
//!   store can expire them on its own.
//!
//! In-memory implementations of both traits are provided for tests.

pub mod error;
pub mod models;
pub mod repositories;

use std::time::Duration;

use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;

use crate::error::StoreError;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Lightweight connectivity probe.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Open an auto-reconnecting Redis connection, bounded by `connect_timeout`.
pub async fn create_redis_connection(
    redis_url: &str,
    connect_timeout: Duration,
) -> Result<ConnectionManager, StoreError> {
    let client = redis::Client::open(redis_url)?;
    match tokio::time::timeout(connect_timeout, ConnectionManager::new(client)).await {
        Ok(conn) => Ok(conn?),
        Err(_) => Err(StoreError::Timeout(connect_timeout)),
    }
}
