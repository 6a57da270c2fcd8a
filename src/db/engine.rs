//! Database engine and connection management

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::Paths;

static DB_ENGINE: OnceCell<Arc<DbEngine>> = OnceCell::new();

/// Database engine wrapper
pub struct DbEngine {
    pool: SqlitePool,
}

impl DbEngine {
    /// Get the global database engine instance
    pub fn get() -> Result<Arc<DbEngine>> {
        DB_ENGINE
            .get()
            .map(Arc::clone)
            .context("Database not initialized")
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Setup the SQLite database
pub async fn setup_sqlite() -> Result<()> {
    let paths = Paths::get()?;
    let db_path = paths.app_db_path();

    // Create connection options with SQLite pragmas
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30))
        .pragma("cache_size", "10000")
        .pragma("foreign_keys", "ON")
        .pragma("temp_store", "FILE")
        .pragma("mmap_size", "0");

    // Create connection pool
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    create_tables(&pool).await?;

    let engine = DbEngine { pool };

    DB_ENGINE
        .set(Arc::new(engine))
        .map_err(|_| anyhow::anyhow!("Database already initialized"))?;

    Ok(())
}

/// Create all database tables
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    // User table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            password TEXT NOT NULL,
            last_upload INTEGER,
            last_voted INTEGER
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_user_username ON user(username);
        "#,
    )
    .execute(pool)
    .await?;

    // Session table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS session (
            id TEXT PRIMARY KEY,
            userid TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            FOREIGN KEY (userid) REFERENCES user(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_session_userid ON session(userid);
        "#,
    )
    .execute(pool)
    .await?;

    // Track table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS track (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            userid TEXT NOT NULL,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            category TEXT NOT NULL,
            is_promoted INTEGER NOT NULL DEFAULT 0,
            promoted_date INTEGER,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (userid) REFERENCES user(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_track_userid ON track(userid);
        CREATE INDEX IF NOT EXISTS idx_track_category ON track(category);
        CREATE INDEX IF NOT EXISTS idx_track_created_at ON track(created_at);
        "#,
    )
    .execute(pool)
    .await?;

    // Upvote table. No unique constraint on (userid, trackid, day): the
    // one-vote-per-day rule lives in the vote write transaction.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS upvote (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            userid TEXT NOT NULL,
            trackid INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (userid) REFERENCES user(id) ON DELETE CASCADE,
            FOREIGN KEY (trackid) REFERENCES track(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_upvote_userid ON upvote(userid);
        CREATE INDEX IF NOT EXISTS idx_upvote_trackid ON upvote(trackid);
        CREATE INDEX IF NOT EXISTS idx_upvote_created_at ON upvote(created_at);
        "#,
    )
    .execute(pool)
    .await?;

    // Migration table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dbmigration (
            id INTEGER PRIMARY KEY,
            version INTEGER NOT NULL DEFAULT 0
        );
        INSERT OR IGNORE INTO dbmigration (id, version) VALUES (1, 0);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
