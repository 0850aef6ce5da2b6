//! Vote cooldown arithmetic.
//!
//! The station directory accepts one vote per user every ten minutes. The
//! store only records when the last vote happened; callers use
//! [`cooldown_remaining`] to decide whether a new vote may be cast.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Minimum interval between two votes from the same user.
pub const VOTE_COOLDOWN: Duration = Duration::from_secs(10 * 60);

/// Time left before another vote is allowed, or `None` if voting is open.
///
/// A last vote recorded in the future (clock skew) blocks for a full cooldown.
pub fn cooldown_remaining(last_vote: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    let Ok(elapsed) = (now - last_vote).to_std() else {
        return Some(VOTE_COOLDOWN);
    };
    VOTE_COOLDOWN
        .checked_sub(elapsed)
        .filter(|remaining| !remaining.is_zero())
}
