//! Track table operations

use anyhow::Result;
use sqlx::{FromRow, SqlitePool};

use crate::models::{Track, TrackType};

/// Database row for track table
#[derive(Debug, FromRow)]
struct TrackRow {
    id: i64,
    userid: String,
    title: String,
    url: String,
    category: String,
    is_promoted: bool,
    promoted_date: Option<i64>,
    created_at: i64,
}

impl TrackRow {
    fn into_track(self) -> Option<Track> {
        let category = TrackType::from_str(&self.category)?;

        Some(Track {
            id: self.id,
            userid: self.userid,
            title: self.title,
            url: self.url,
            category,
            is_promoted: self.is_promoted,
            promoted_date: self.promoted_date,
            created_at: self.created_at,
        })
    }
}

/// One board row: a track joined with its author and 7-day vote count.
/// Ordering and truncation happen in `core::ranking`, not in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct BoardRow {
    pub id: i64,
    pub userid: String,
    pub author: String,
    pub title: String,
    pub url: String,
    pub category: String,
    pub is_promoted: bool,
    pub promoted_date: Option<i64>,
    pub created_at: i64,
    pub vote_count: i64,
}

/// Track table operations
pub struct TrackTable;

impl TrackTable {
    /// Get track by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Track>> {
        let row: Option<TrackRow> = sqlx::query_as("SELECT * FROM track WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.and_then(|r| r.into_track()))
    }

    /// Register a freshly uploaded track.
    ///
    /// Stamps the uploader's `last_upload` and inserts the track row inside
    /// one transaction: either both writes commit or neither does. The blob
    /// upload must already be confirmed before this is called.
    pub async fn register(
        pool: &SqlitePool,
        user_id: &str,
        title: &str,
        category: TrackType,
        url: &str,
        now: i64,
    ) -> Result<Track> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE user SET last_upload = ? WHERE id = ?")
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "INSERT INTO track (userid, title, url, category, is_promoted, created_at) \
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(user_id)
        .bind(title)
        .bind(category.as_str())
        .bind(url)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        tx.commit().await?;

        Ok(Track {
            id,
            userid: user_id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            category,
            is_promoted: false,
            promoted_date: None,
            created_at: now,
        })
    }

    /// Fetch every track with its author username and the number of upvotes
    /// since `window_start` (unix seconds).
    pub async fn board_rows(pool: &SqlitePool, window_start: i64) -> Result<Vec<BoardRow>> {
        let rows: Vec<BoardRow> = sqlx::query_as(
            "SELECT t.id, t.userid, u.username AS author, t.title, t.url, t.category, \
                    t.is_promoted, t.promoted_date, t.created_at, \
                    COUNT(v.id) AS vote_count \
             FROM track t \
             INNER JOIN user u ON u.id = t.userid \
             LEFT JOIN upvote v ON v.trackid = t.id AND v.created_at >= ? \
             GROUP BY t.id",
        )
        .bind(window_start)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Mark a track as promoted (operator data entry; promoted tracks pin
    /// first on the board and reject votes)
    pub async fn promote(pool: &SqlitePool, id: i64, now: i64) -> Result<bool> {
        let result =
            sqlx::query("UPDATE track SET is_promoted = 1, promoted_date = ? WHERE id = ?")
                .bind(now)
                .bind(id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get track count
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM track")
            .fetch_one(pool)
            .await?;

        Ok(row.0)
    }
}
