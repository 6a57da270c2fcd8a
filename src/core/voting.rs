//! The vote write path
//!
//! `cast_vote` runs an ordered precondition chain against current state,
//! then records the vote and the voter's cooldown stamp in one transaction.

use sqlx::SqlitePool;
use thiserror::Error;

use crate::core::eligibility::{can_act, next_eligible, ACTION_COOLDOWN_SECS};
use crate::db::{TrackTable, UserTable, VoteTable};
use crate::utils::dates::start_of_day_for;

/// Everything that can go wrong when casting a vote. Each variant maps to a
/// distinct HTTP status and error code in the API layer.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("not authenticated")]
    Unauthorized,

    #[error("invalid track id")]
    InvalidTrackId,

    /// Vote cooldown not elapsed. Carries the timestamp at which the voter
    /// becomes eligible again.
    #[error("vote limit reached")]
    RateLimited { next_vote: i64 },

    #[error("track not found")]
    TrackNotFound,

    #[error("promoted tracks cannot be voted on")]
    PromotedTrack,

    #[error("already voted on this track today")]
    AlreadyVotedToday,

    #[error("cannot vote on your own track")]
    OwnTrack,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Cast a vote by `voter_id` on `track_id` at `now`.
///
/// Preconditions run in a fixed order and short-circuit on the first
/// failure; nothing is written until all of them pass. Note the two
/// different windows: the cooldown gate is a rolling 24 hours from the last
/// vote, while the duplicate check covers the calendar day (local midnight)
/// of `now`. The write phase is a single transaction inserting the upvote
/// and stamping the voter's `last_voted`, with the duplicate check repeated
/// under the write lock so concurrent same-day votes cannot both land.
///
/// Returns the voted track's title for user feedback.
pub async fn cast_vote(
    pool: &SqlitePool,
    voter_id: &str,
    track_id: i64,
    now: i64,
) -> Result<String, VoteError> {
    if voter_id.trim().is_empty() {
        return Err(VoteError::Unauthorized);
    }

    if track_id <= 0 {
        return Err(VoteError::InvalidTrackId);
    }

    let voter = UserTable::get_by_id(pool, voter_id)
        .await?
        .ok_or(VoteError::Unauthorized)?;

    if !can_act(voter.last_voted, now, ACTION_COOLDOWN_SECS) {
        // can_act only fails when last_voted is set
        let last = voter.last_voted.unwrap_or(now);
        return Err(VoteError::RateLimited {
            next_vote: next_eligible(last, ACTION_COOLDOWN_SECS),
        });
    }

    let track = TrackTable::get_by_id(pool, track_id)
        .await?
        .ok_or(VoteError::TrackNotFound)?;

    if track.is_promoted {
        return Err(VoteError::PromotedTrack);
    }

    let day_start = start_of_day_for(now);
    if VoteTable::exists_same_day(pool, voter_id, track_id, day_start).await? {
        return Err(VoteError::AlreadyVotedToday);
    }

    if track.userid == voter_id {
        return Err(VoteError::OwnTrack);
    }

    let recorded = VoteTable::record(pool, voter_id, track_id, now, day_start).await?;
    if recorded.is_none() {
        // a concurrent vote won the race between our pre-check and the
        // transaction's re-check
        return Err(VoteError::AlreadyVotedToday);
    }

    Ok(track.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::models::{TrackType, User};

    const NOW: i64 = 1_750_000_000;

    async fn seed_user(pool: &SqlitePool, username: &str) -> User {
        let user = User::new(username.to_string(), "hash".to_string());
        UserTable::insert(pool, &user).await.unwrap();
        user
    }

    async fn seed_track(pool: &SqlitePool, owner: &User, title: &str) -> i64 {
        let track = TrackTable::register(
            pool,
            &owner.id,
            title,
            TrackType::Bass,
            "https://cdn.example/Bass/riff1.mp3",
            NOW - 86_400 * 2,
        )
        .await
        .unwrap();
        track.id
    }

    #[tokio::test]
    async fn test_vote_success_returns_title_and_stamps_voter() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "author").await;
        let voter = seed_user(&pool, "voter").await;
        let track_id = seed_track(&pool, &author, "Riff1").await;

        let title = cast_vote(&pool, &voter.id, track_id, NOW).await.unwrap();
        assert_eq!(title, "Riff1");

        let voter = UserTable::get_by_id(&pool, &voter.id).await.unwrap().unwrap();
        assert_eq!(voter.last_voted, Some(NOW));

        let count = VoteTable::count_since(&pool, track_id, NOW - 7 * 86_400)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_second_same_day_vote_conflicts() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "author").await;
        let voter = seed_user(&pool, "voter").await;
        let track_id = seed_track(&pool, &author, "Riff1").await;

        cast_vote(&pool, &voter.id, track_id, NOW).await.unwrap();

        // immediately retrying the same track trips the duplicate check
        // before the cooldown gate would even matter
        let err = cast_vote(&pool, &voter.id, track_id, NOW).await.unwrap_err();
        assert!(matches!(err, VoteError::AlreadyVotedToday));

        // still exactly one persisted vote
        let count = VoteTable::count_since(&pool, track_id, 0).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_cooldown_rate_limits_with_next_eligible() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "author").await;
        let voter = seed_user(&pool, "voter").await;
        let first = seed_track(&pool, &author, "Riff1").await;
        let second = seed_track(&pool, &author, "Riff2").await;

        cast_vote(&pool, &voter.id, first, NOW).await.unwrap();

        // a different track one hour later is blocked by the rolling window
        let err = cast_vote(&pool, &voter.id, second, NOW + 3600)
            .await
            .unwrap_err();
        match err {
            VoteError::RateLimited { next_vote } => {
                assert_eq!(next_vote, NOW + ACTION_COOLDOWN_SECS);
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_own_track_is_forbidden() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "author").await;
        let track_id = seed_track(&pool, &author, "Riff1").await;

        let err = cast_vote(&pool, &author.id, track_id, NOW).await.unwrap_err();
        assert!(matches!(err, VoteError::OwnTrack));

        let count = VoteTable::count_since(&pool, track_id, 0).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_promoted_track_rejects_votes() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "author").await;
        let voter = seed_user(&pool, "voter").await;
        let track_id = seed_track(&pool, &author, "Riff1").await;
        TrackTable::promote(&pool, track_id, NOW - 3600).await.unwrap();

        let err = cast_vote(&pool, &voter.id, track_id, NOW).await.unwrap_err();
        assert!(matches!(err, VoteError::PromotedTrack));
    }

    #[tokio::test]
    async fn test_missing_track_not_found() {
        let pool = test_pool().await;
        let voter = seed_user(&pool, "voter").await;

        let err = cast_vote(&pool, &voter.id, 999, NOW).await.unwrap_err();
        assert!(matches!(err, VoteError::TrackNotFound));
    }

    #[tokio::test]
    async fn test_bad_identity_and_bad_track_id() {
        let pool = test_pool().await;
        let voter = seed_user(&pool, "voter").await;

        let err = cast_vote(&pool, "", 1, NOW).await.unwrap_err();
        assert!(matches!(err, VoteError::Unauthorized));

        let err = cast_vote(&pool, "  ", 1, NOW).await.unwrap_err();
        assert!(matches!(err, VoteError::Unauthorized));

        let err = cast_vote(&pool, &voter.id, 0, NOW).await.unwrap_err();
        assert!(matches!(err, VoteError::InvalidTrackId));

        let err = cast_vote(&pool, &voter.id, -3, NOW).await.unwrap_err();
        assert!(matches!(err, VoteError::InvalidTrackId));

        // an identity that resolves to no user is unauthorized, not a 500
        let err = cast_vote(&pool, "ghost", 1, NOW).await.unwrap_err();
        assert!(matches!(err, VoteError::Unauthorized));
    }

    #[tokio::test]
    async fn test_next_calendar_day_allows_revote() {
        let pool = test_pool().await;
        let author = seed_user(&pool, "author").await;
        let voter = seed_user(&pool, "voter").await;
        let track_id = seed_track(&pool, &author, "Riff1").await;

        cast_vote(&pool, &voter.id, track_id, NOW).await.unwrap();

        // 48h later is both past the cooldown and past the day boundary
        let later = NOW + 2 * 86_400;
        let title = cast_vote(&pool, &voter.id, track_id, later).await.unwrap();
        assert_eq!(title, "Riff1");

        let count = VoteTable::count_since(&pool, track_id, 0).await.unwrap();
        assert_eq!(count, 2);
    }
}
