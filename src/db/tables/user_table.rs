//! User table operations

use anyhow::Result;
use sqlx::{FromRow, SqlitePool};

use crate::models::User;

/// Database row for user table
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    username: String,
    password: String,
    last_upload: Option<i64>,
    last_voted: Option<i64>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            password: self.password,
            last_upload: self.last_upload,
            last_voted: self.last_voted,
        }
    }
}

/// User table operations
pub struct UserTable;

impl UserTable {
    /// Get user by ID
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_user()))
    }

    /// Get user by username
    pub async fn get_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_user()))
    }

    /// Insert a user
    pub async fn insert(pool: &SqlitePool, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO user (id, username, password, last_upload, last_voted) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.last_upload)
        .bind(user.last_voted)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get user count
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user")
            .fetch_one(pool)
            .await?;

        Ok(row.0)
    }
}
