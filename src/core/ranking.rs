//! The board read path
//!
//! Ranks every track by its rolling 7-day vote count, pins promoted tracks
//! first, truncates to the top 50 overall, and partitions the result into
//! the five category lanes. Ordering, truncation, partitioning, and the
//! viewer annotation are pure functions over fetched rows.

use std::collections::HashSet;

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::core::eligibility::{can_act, ACTION_COOLDOWN_SECS};
use crate::db::{BoardRow, TrackTable, VoteTable};
use crate::models::{TrackType, User};
use crate::utils::dates::start_of_day_for;

/// Board size across all categories combined
pub const BOARD_LIMIT: usize = 50;

/// Rolling window for vote tallies, in seconds (7 days). Distinct from the
/// calendar-day window used for duplicate-vote detection.
pub const VOTE_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// One ranked board entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEntry {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub category: TrackType,
    pub created_at: i64,
    pub author: String,
    pub author_id: String,
    pub is_promoted: bool,
    pub promoted_date: Option<i64>,
    pub vote_count: i64,
    /// Advisory only: the vote write path re-checks everything
    pub can_vote: bool,
}

/// The board, partitioned into the five category lanes
#[derive(Debug, Default, Serialize)]
pub struct BoardByCategory {
    #[serde(rename = "Melody")]
    pub melody: Vec<BoardEntry>,
    #[serde(rename = "Bass")]
    pub bass: Vec<BoardEntry>,
    #[serde(rename = "Drum")]
    pub drum: Vec<BoardEntry>,
    #[serde(rename = "Other 1")]
    pub other_1: Vec<BoardEntry>,
    #[serde(rename = "Other 2")]
    pub other_2: Vec<BoardEntry>,
}

impl BoardByCategory {
    /// Total entries across all lanes
    pub fn len(&self) -> usize {
        self.melody.len()
            + self.bass.len()
            + self.drum.len()
            + self.other_1.len()
            + self.other_2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute the ranked board at `now`, annotated for `viewer` when present.
///
/// Read-only; safe to run concurrently with vote/upload writes, which at
/// worst makes the tallies one vote stale.
pub async fn compute_board(
    pool: &SqlitePool,
    viewer: Option<&User>,
    now: i64,
) -> Result<BoardByCategory> {
    let rows = TrackTable::board_rows(pool, now - VOTE_WINDOW_SECS).await?;
    let mut entries = rank(rows);

    if let Some(viewer) = viewer {
        let voted_today =
            VoteTable::voted_today(pool, &viewer.id, start_of_day_for(now)).await?;
        let cooldown_ok = can_act(viewer.last_voted, now, ACTION_COOLDOWN_SECS);
        annotate(&mut entries, viewer, &voted_today, cooldown_ok);
    }

    Ok(group_by_category(entries))
}

/// Order rows by the composite key, descending, and truncate to the board
/// limit BEFORE any category partitioning: promoted first (more recently
/// promoted wins among them), then 7-day vote count, ties to newer tracks.
/// Rows with a category the board does not know are dropped.
pub fn rank(rows: Vec<BoardRow>) -> Vec<BoardEntry> {
    let mut entries: Vec<BoardEntry> = rows
        .into_iter()
        .filter_map(|row| {
            let category = TrackType::from_str(&row.category)?;
            Some(BoardEntry {
                id: row.id,
                title: row.title,
                url: row.url,
                category,
                created_at: row.created_at,
                author: row.author,
                author_id: row.userid,
                is_promoted: row.is_promoted,
                promoted_date: row.promoted_date,
                vote_count: row.vote_count,
                can_vote: false,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        let key_a = (a.is_promoted, a.vote_count, a.promoted_date, a.created_at);
        let key_b = (b.is_promoted, b.vote_count, b.promoted_date, b.created_at);
        key_b.cmp(&key_a)
    });

    entries.truncate(BOARD_LIMIT);
    entries
}

/// Set the advisory `can_vote` flag for a viewer: not promoted, not their
/// own track, not already voted on it this calendar day, and the 24h vote
/// cooldown has elapsed.
pub fn annotate(
    entries: &mut [BoardEntry],
    viewer: &User,
    voted_today: &HashSet<i64>,
    cooldown_ok: bool,
) {
    for entry in entries {
        entry.can_vote = !entry.is_promoted
            && entry.author_id != viewer.id
            && !voted_today.contains(&entry.id)
            && cooldown_ok;
    }
}

/// Partition ranked entries into the five lanes, preserving relative order
pub fn group_by_category(entries: Vec<BoardEntry>) -> BoardByCategory {
    let mut board = BoardByCategory::default();

    for entry in entries {
        match entry.category {
            TrackType::Melody => board.melody.push(entry),
            TrackType::Bass => board.bass.push(entry),
            TrackType::Drum => board.drum.push(entry),
            TrackType::Other1 => board.other_1.push(entry),
            TrackType::Other2 => board.other_2.push(entry),
        }
    }

    board
}
