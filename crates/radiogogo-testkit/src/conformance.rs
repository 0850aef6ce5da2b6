//! Behavior every StationStore backend must share.
//!
//! Each check takes an opener that builds a store in a given directory, so
//! the same assertions run against every backend. Checks that reopen the
//! store call the opener again on the same directory.

use std::collections::HashSet;
use std::path::Path;
use std::thread;

use chrono::{TimeZone, Utc};
use radiogogo_core::StationRef;
use radiogogo_store::StationStore;

use crate::fixtures::{station, TestDir};
use crate::generators::SetOp;

fn as_set(ids: Vec<StationRef>) -> HashSet<StationRef> {
    ids.into_iter().collect()
}

/// Add then remove flips membership both ways.
pub fn add_then_remove<S, F>(open: F)
where
    S: StationStore,
    F: Fn(&Path) -> S,
{
    let dir = TestDir::new();
    let store = open(dir.path());
    let id = station(1);

    assert!(!store.is_bookmarked(&id));
    store.add_bookmark(&id).unwrap();
    assert!(store.is_bookmarked(&id));
    store.remove_bookmark(&id).unwrap();
    assert!(!store.is_bookmarked(&id));

    store.add_hidden(&id).unwrap();
    assert!(store.is_hidden(&id));
    store.remove_hidden(&id).unwrap();
    assert!(!store.is_hidden(&id));
}

/// Adding twice leaves a single entry.
pub fn add_is_idempotent<S, F>(open: F)
where
    S: StationStore,
    F: Fn(&Path) -> S,
{
    let dir = TestDir::new();
    let store = open(dir.path());
    let id = station(2);

    store.add_bookmark(&id).unwrap();
    store.add_bookmark(&id).unwrap();
    assert_eq!(store.get_bookmarks(), vec![id]);

    store.add_hidden(&id).unwrap();
    store.add_hidden(&id).unwrap();
    assert_eq!(store.get_hidden(), vec![id]);
}

/// Removing an id that was never added succeeds and changes nothing.
pub fn remove_absent_is_ok<S, F>(open: F)
where
    S: StationStore,
    F: Fn(&Path) -> S,
{
    let dir = TestDir::new();
    let store = open(dir.path());
    store.add_bookmark(&station(1)).unwrap();

    store.remove_bookmark(&station(9)).unwrap();
    store.remove_hidden(&station(9)).unwrap();
    assert_eq!(store.get_bookmarks(), vec![station(1)]);
    assert!(store.get_hidden().is_empty());
}

/// Bookmarks and hidden stations do not affect each other.
pub fn sets_are_independent<S, F>(open: F)
where
    S: StationStore,
    F: Fn(&Path) -> S,
{
    let dir = TestDir::new();
    let store = open(dir.path());
    let both = station(1);
    let only_hidden = station(2);

    store.add_bookmark(&both).unwrap();
    assert!(!store.is_hidden(&both));

    store.add_hidden(&both).unwrap();
    store.add_hidden(&only_hidden).unwrap();
    assert!(store.is_bookmarked(&both));
    assert!(!store.is_bookmarked(&only_hidden));

    store.remove_hidden(&both).unwrap();
    assert!(store.is_bookmarked(&both));
    assert_eq!(store.get_hidden(), vec![only_hidden]);
}

/// A new instance on the same directory sees the same state.
pub fn reopen_preserves_state<S, F>(open: F)
where
    S: StationStore,
    F: Fn(&Path) -> S,
{
    let dir = TestDir::new();
    let voted_at = Utc.with_ymd_and_hms(2024, 5, 17, 21, 4, 33).unwrap();

    let (bookmarks, hidden) = {
        let store = open(dir.path());
        for n in 1..=5 {
            store.add_bookmark(&station(n)).unwrap();
        }
        store.remove_bookmark(&station(3)).unwrap();
        store.add_hidden(&station(4)).unwrap();
        store.add_hidden(&station(10)).unwrap();
        if let Some(votes) = store.as_vote_store() {
            votes.set_last_vote_timestamp(voted_at).unwrap();
        }
        let state = (as_set(store.get_bookmarks()), as_set(store.get_hidden()));
        store.close().unwrap();
        state
    };

    let store = open(dir.path());
    assert_eq!(as_set(store.get_bookmarks()), bookmarks);
    assert_eq!(as_set(store.get_hidden()), hidden);
    assert_eq!(bookmarks.len(), 4);
    if let Some(votes) = store.as_vote_store() {
        assert_eq!(votes.get_last_vote_timestamp(), Some(voted_at));
    }
}

/// Vote tracking, where offered, starts empty and keeps the last write.
pub fn vote_capability<S, F>(open: F)
where
    S: StationStore,
    F: Fn(&Path) -> S,
{
    let dir = TestDir::new();
    let store = open(dir.path());
    let Some(votes) = store.as_vote_store() else {
        return;
    };

    assert_eq!(votes.get_last_vote_timestamp(), None);
    let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    votes.set_last_vote_timestamp(first).unwrap();
    assert_eq!(votes.get_last_vote_timestamp(), Some(first));
    votes.set_last_vote_timestamp(second).unwrap();
    assert_eq!(votes.get_last_vote_timestamp(), Some(second));
}

/// Many threads adding and reading at once lose nothing.
pub fn concurrent_adds<S, F>(open: F)
where
    S: StationStore,
    F: Fn(&Path) -> S,
{
    const THREADS: u8 = 8;
    const PER_THREAD: u8 = 25;

    let dir = TestDir::new();
    let store = open(dir.path());

    let expected: HashSet<StationRef> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let store = &store;
                scope.spawn(move || {
                    let mut added = HashSet::new();
                    for i in 0..PER_THREAD {
                        // Neighbouring threads overlap on half their ids
                        let n = (t / 2) * PER_THREAD + i;
                        let id = StationRef::from_bytes([n; 16]);
                        store.add_bookmark(&id).unwrap();
                        assert!(store.is_bookmarked(&id));
                        if i % 5 == 0 {
                            store.add_hidden(&id).unwrap();
                        }
                        let _ = store.get_bookmarks();
                        added.insert(id);
                    }
                    added
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(expected.len(), usize::from(THREADS / 2) * usize::from(PER_THREAD));
    assert_eq!(as_set(store.get_bookmarks()), expected);
    assert_eq!(store.get_hidden().len(), expected.len() / 5);

    store.close().unwrap();
    drop(store);
    let reopened = open(dir.path());
    assert_eq!(as_set(reopened.get_bookmarks()), expected);
}

/// Applying `ops` to bookmarks matches a plain set, before and after reopen.
pub fn ops_match_model<S, F>(open: F, ops: &[SetOp])
where
    S: StationStore,
    F: Fn(&Path) -> S,
{
    let dir = TestDir::new();
    let mut model = HashSet::new();

    {
        let store = open(dir.path());
        for op in ops {
            match op {
                SetOp::Add(id) => store.add_bookmark(id).unwrap(),
                SetOp::Remove(id) => store.remove_bookmark(id).unwrap(),
            }
            op.apply_to(&mut model);
        }
        assert_eq!(as_set(store.get_bookmarks()), model);
        assert!(store.get_hidden().is_empty());
        store.close().unwrap();
    }

    let store = open(dir.path());
    assert_eq!(as_set(store.get_bookmarks()), model);
}
