//! Store traits: the interface the UI layer programs against.
//!
//! The UI never knows which backend is active. Vote-timestamp tracking is a
//! separate capability, discovered through [`StationStore::as_vote_store`];
//! a backend without it returns `None` rather than silently ignoring writes.

use chrono::{DateTime, Utc};
use radiogogo_core::StationRef;

use crate::error::Result;

/// Bookmarked and hidden stations.
///
/// All methods are safe to call concurrently. Reads are served from the
/// in-memory cache and never fail; mutations persist before returning.
///
/// # Design Notes
///
/// - **Idempotent**: adding an existing id or removing an absent one succeeds.
/// - **Independent sets**: a station may be bookmarked and hidden at once.
/// - **Unordered**: `get_*` returns ids in no particular order.
pub trait StationStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Bookmarks
    // ─────────────────────────────────────────────────────────────────────────

    /// All bookmarked stations.
    fn get_bookmarks(&self) -> Vec<StationRef>;

    /// Bookmark a station.
    fn add_bookmark(&self, id: &StationRef) -> Result<()>;

    /// Remove a bookmark. Removing an absent id is not an error.
    fn remove_bookmark(&self, id: &StationRef) -> Result<()>;

    /// Whether the station is bookmarked.
    fn is_bookmarked(&self, id: &StationRef) -> bool;

    // ─────────────────────────────────────────────────────────────────────────
    // Hidden stations
    // ─────────────────────────────────────────────────────────────────────────

    /// All hidden stations.
    fn get_hidden(&self) -> Vec<StationRef>;

    /// Hide a station from results.
    fn add_hidden(&self, id: &StationRef) -> Result<()>;

    /// Unhide a station. Removing an absent id is not an error.
    fn remove_hidden(&self, id: &StationRef) -> Result<()>;

    /// Whether the station is hidden.
    fn is_hidden(&self, id: &StationRef) -> bool;

    // ─────────────────────────────────────────────────────────────────────────
    // Capabilities and lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Vote-timestamp tracking, if this backend supports it.
    fn as_vote_store(&self) -> Option<&dyn VoteStore> {
        None
    }

    /// Release underlying handles. Calling it again is a no-op.
    ///
    /// The caller must not issue new operations once `close` has started.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Records the most recent successful vote, for the ten-minute cooldown.
///
/// The store only records; it does not enforce the interval
/// (see [`radiogogo_core::cooldown_remaining`]).
pub trait VoteStore: StationStore {
    /// The last recorded vote, or `None` if the user never voted.
    fn get_last_vote_timestamp(&self) -> Option<DateTime<Utc>>;

    /// Record a vote, unconditionally replacing any earlier value.
    ///
    /// Out-of-order timestamps are accepted.
    fn set_last_vote_timestamp(&self, at: DateTime<Utc>) -> Result<()>;
}
