//! Session table operations

use anyhow::Result;
use sqlx::{FromRow, SqlitePool};

use crate::models::Session;

/// Database row for session table
#[derive(Debug, FromRow)]
struct SessionRow {
    id: String,
    userid: String,
    expires_at: i64,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            id: self.id,
            userid: self.userid,
            expires_at: self.expires_at,
        }
    }
}

/// Session table operations
pub struct SessionTable;

impl SessionTable {
    /// Look up a session by its token
    pub async fn get(pool: &SqlitePool, token: &str) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as("SELECT * FROM session WHERE id = ?")
            .bind(token)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| r.into_session()))
    }

    /// Insert a session
    pub async fn insert(pool: &SqlitePool, session: &Session) -> Result<()> {
        sqlx::query("INSERT INTO session (id, userid, expires_at) VALUES (?, ?, ?)")
            .bind(&session.id)
            .bind(&session.userid)
            .bind(session.expires_at)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Delete a session by its token
    pub async fn delete(pool: &SqlitePool, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM session WHERE id = ?")
            .bind(token)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop every session that expired before `now`
    pub async fn delete_expired(pool: &SqlitePool, now: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at <= ?")
            .bind(now)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
