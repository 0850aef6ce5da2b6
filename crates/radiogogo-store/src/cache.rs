//! In-memory mirror of persisted preferences.
//!
//! Both backends keep one [`StationCache`] behind an `RwLock`. The cache only
//! holds plain sets, so a lock poisoned by a panicking writer still guards a
//! valid value and is recovered rather than propagated.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use radiogogo_core::StationRef;

use crate::config::{BOOKMARKS_FILE, HIDDEN_FILE};

/// One of the two station sets a store keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// User favorites.
    Bookmarks,
    /// Stations suppressed from search results.
    Hidden,
}

impl Collection {
    /// Both collections.
    pub const ALL: [Collection; 2] = [Collection::Bookmarks, Collection::Hidden];

    /// Backing file name for the flat-file backend.
    pub const fn file_name(self) -> &'static str {
        match self {
            Collection::Bookmarks => BOOKMARKS_FILE,
            Collection::Hidden => HIDDEN_FILE,
        }
    }

    /// Backing table name for the SQLite backend.
    pub const fn table(self) -> &'static str {
        match self {
            Collection::Bookmarks => "bookmarks",
            Collection::Hidden => "hidden",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct StationCache {
    pub bookmarks: HashSet<StationRef>,
    pub hidden: HashSet<StationRef>,
    /// Always `None` for the flat-file backend.
    pub last_vote: Option<DateTime<Utc>>,
}

impl StationCache {
    pub fn set(&self, collection: Collection) -> &HashSet<StationRef> {
        match collection {
            Collection::Bookmarks => &self.bookmarks,
            Collection::Hidden => &self.hidden,
        }
    }

    pub fn set_mut(&mut self, collection: Collection) -> &mut HashSet<StationRef> {
        match collection {
            Collection::Bookmarks => &mut self.bookmarks,
            Collection::Hidden => &mut self.hidden,
        }
    }

    pub fn contains(&self, collection: Collection, id: &StationRef) -> bool {
        self.set(collection).contains(id)
    }

    pub fn list(&self, collection: Collection) -> Vec<StationRef> {
        self.set(collection).iter().copied().collect()
    }
}

pub(crate) fn read(lock: &RwLock<StationCache>) -> RwLockReadGuard<'_, StationCache> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write(lock: &RwLock<StationCache>) -> RwLockWriteGuard<'_, StationCache> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
