//! Upvote model

use serde::{Deserialize, Serialize};

/// A single upvote on a track.
///
/// Upvotes are append-only: rows are never updated or deleted. The one-per-
/// calendar-day rule for a (user, track) pair is enforced by the vote write
/// path, not by the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upvote {
    /// Database ID
    pub id: i64,
    /// Voting user ID
    pub userid: String,
    /// Target track ID
    pub trackid: i64,
    /// Unix timestamp of the vote
    pub created_at: i64,
}
