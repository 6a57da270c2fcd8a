//! Cooldown eligibility checks
//!
//! Both uploads and votes are limited to one per 24 hours per user. The
//! check is a pure function over unix timestamps; callers pass the current
//! time explicitly.

/// Cooldown between two actions of the same kind, in seconds (24 hours).
/// Shared by the upload and vote gates.
pub const ACTION_COOLDOWN_SECS: i64 = 24 * 60 * 60;

/// Whether a user may act again at `now`, given the timestamp of their last
/// action of the same kind. A user who never acted may always act.
pub fn can_act(last_action: Option<i64>, now: i64, cooldown_secs: i64) -> bool {
    match last_action {
        None => true,
        Some(last) => now >= last + cooldown_secs,
    }
}

/// The earliest timestamp at which a user who last acted at `last_action`
/// may act again. Carried on rate-limit failures so clients can show a
/// countdown.
pub fn next_eligible(last_action: i64, cooldown_secs: i64) -> i64 {
    last_action + cooldown_secs
}
