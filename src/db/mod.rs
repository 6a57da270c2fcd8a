//! Database module for Trackboard
//!
//! This module handles all database operations using SQLx with SQLite.

mod engine;
mod migrations;
pub mod tables;

pub use engine::{create_tables, setup_sqlite, DbEngine};
pub use migrations::run_migrations;
pub use tables::*;

/// Single-connection in-memory database for exercising the write paths
/// and ranking queries in tests.
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    create_tables(&pool).await.expect("create tables");
    pool
}
