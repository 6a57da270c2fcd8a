//! Upvote table operations

use std::collections::HashSet;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::models::Upvote;

/// Upvote table operations
pub struct VoteTable;

impl VoteTable {
    /// Check whether `user_id` already voted on `track_id` since `day_start`
    /// (local midnight)
    pub async fn exists_same_day(
        pool: &SqlitePool,
        user_id: &str,
        track_id: i64,
        day_start: i64,
    ) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM upvote WHERE userid = ? AND trackid = ? AND created_at >= ?",
        )
        .bind(user_id)
        .bind(track_id)
        .bind(day_start)
        .fetch_one(pool)
        .await?;

        Ok(row.0 > 0)
    }

    /// Track IDs the user has voted on since `day_start`
    pub async fn voted_today(
        pool: &SqlitePool,
        user_id: &str,
        day_start: i64,
    ) -> Result<HashSet<i64>> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT trackid FROM upvote WHERE userid = ? AND created_at >= ?")
                .bind(user_id)
                .bind(day_start)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Record a vote: insert the upvote row and stamp the voter's
    /// `last_voted`, atomically.
    ///
    /// The user-row UPDATE runs first so that concurrent votes by the same
    /// user serialize on SQLite's writer lock; the same-day duplicate check
    /// is then repeated inside the transaction, where it observes any vote
    /// committed after the caller's pre-checks. Returns `None` (and commits
    /// nothing) when a duplicate is found.
    pub async fn record(
        pool: &SqlitePool,
        user_id: &str,
        track_id: i64,
        now: i64,
        day_start: i64,
    ) -> Result<Option<Upvote>> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE user SET last_voted = ? WHERE id = ?")
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM upvote WHERE userid = ? AND trackid = ? AND created_at >= ?",
        )
        .bind(user_id)
        .bind(track_id)
        .bind(day_start)
        .fetch_one(&mut *tx)
        .await?;

        if row.0 > 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let result = sqlx::query("INSERT INTO upvote (userid, trackid, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(track_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let id = result.last_insert_rowid();
        tx.commit().await?;

        Ok(Some(Upvote {
            id,
            userid: user_id.to_string(),
            trackid: track_id,
            created_at: now,
        }))
    }

    /// Total votes for a track since `window_start`
    pub async fn count_since(pool: &SqlitePool, track_id: i64, window_start: i64) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM upvote WHERE trackid = ? AND created_at >= ?",
        )
        .bind(track_id)
        .bind(window_start)
        .fetch_one(pool)
        .await?;

        Ok(row.0)
    }
}
