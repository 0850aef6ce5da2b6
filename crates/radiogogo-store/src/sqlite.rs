//! SQLite implementation of the StationStore and VoteStore traits.
//!
//! This is the default backend. The database runs in WAL mode; opening it
//! checks integrity, quarantines a corrupted file once, migrates the schema
//! and loads every table into the cache.
//!
//! Mutations execute their statement first and only touch the cache once it
//! succeeds, so a returned error leaves both disk and cache unchanged.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use radiogogo_core::{ParsedRefs, StationRef};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::cache::{self, Collection, StationCache};
use crate::config::{ensure_dir, DATABASE_FILE};
use crate::error::{Result, StoreError};
use crate::migration;
use crate::recovery;
use crate::traits::{StationStore, VoteStore};

/// SQLite-based store implementation.
///
/// Thread-safe. The cache sits behind an `RwLock`; the connection behind a
/// `Mutex`, always acquired after the cache lock. SQLite serializes its own
/// writers; the locks here keep the cache coherent with the database.
pub struct SqliteStore {
    /// The connection, `None` once closed.
    conn: Mutex<Option<Connection>>,

    cache: RwLock<StationCache>,

    /// Database file, `None` for in-memory stores.
    path: Option<PathBuf>,

    /// Where a corrupted database was moved during open, if that happened.
    recovered_from: Option<PathBuf>,
}

/// Why an open attempt failed.
enum OpenFailure {
    Corrupt(String),
    Other(StoreError),
}

impl From<rusqlite::Error> for OpenFailure {
    fn from(err: rusqlite::Error) -> Self {
        if recovery::is_corruption(&err) {
            OpenFailure::Corrupt(err.to_string())
        } else {
            OpenFailure::Other(err.into())
        }
    }
}

impl SqliteStore {
    /// Open `radiogogo.db` in `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        ensure_dir(dir)?;
        Self::open_path(dir.join(DATABASE_FILE))
    }

    /// Open the database file at `path`. The parent directory must exist.
    ///
    /// A corrupted file is renamed to `<name>.corrupted.<timestamp>` and a
    /// fresh database is created in its place. If that fresh database cannot
    /// be opened either, this fails with [`StoreError::StorageCorrupted`].
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let (mut conn, recovered_from) = match open_checked(&path) {
            Ok(conn) => (conn, None),
            Err(OpenFailure::Other(err)) => return Err(err),
            Err(OpenFailure::Corrupt(reason)) => {
                warn!(path = %path.display(), %reason, "database failed integrity check");
                let (conn, moved) = recover(&path, recovery::quarantine)?;
                warn!(path = %path.display(), moved_to = %moved.display(), "started fresh database");
                (conn, Some(moved))
            }
        };

        migration::migrate(&mut conn)?;
        let cache = load_cache(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            cache: RwLock::new(cache),
            path: Some(path),
            recovered_from,
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        let cache = load_cache(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            cache: RwLock::new(cache),
            path: None,
            recovered_from: None,
        })
    }

    /// Database file location, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Where the corrupted database was moved, if open had to recover.
    pub fn recovered_from(&self) -> Option<&Path> {
        self.recovered_from.as_deref()
    }

    /// Whether [`close`](StationStore::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Execute an operation on the open connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let conn = conn.as_mut().ok_or(StoreError::Closed)?;
        f(conn)
    }

    fn insert(&self, collection: Collection, id: &StationRef) -> Result<()> {
        let mut cache = cache::write(&self.cache);
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} (station_uuid, created_at) VALUES (?1, ?2)
                     ON CONFLICT(station_uuid) DO NOTHING",
                    collection.table()
                ),
                params![id.to_string(), now_rfc3339()],
            )?;
            Ok(())
        })?;
        cache.set_mut(collection).insert(*id);
        Ok(())
    }

    /// Insert many ids in one transaction. Used by the legacy import.
    pub(crate) fn insert_many(&self, collection: Collection, ids: &HashSet<StationRef>) -> Result<()> {
        let mut cache = cache::write(&self.cache);
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "INSERT INTO {} (station_uuid, created_at) VALUES (?1, ?2)
                     ON CONFLICT(station_uuid) DO NOTHING",
                    collection.table()
                ))?;
                let now = now_rfc3339();
                for id in ids {
                    stmt.execute(params![id.to_string(), now])?;
                }
            }
            tx.commit()?;
            Ok(())
        })?;
        cache.set_mut(collection).extend(ids.iter().copied());
        Ok(())
    }

    fn remove(&self, collection: Collection, id: &StationRef) -> Result<()> {
        let mut cache = cache::write(&self.cache);
        self.with_conn(|conn| {
            conn.execute(
                &format!("DELETE FROM {} WHERE station_uuid = ?1", collection.table()),
                params![id.to_string()],
            )?;
            Ok(())
        })?;
        cache.set_mut(collection).remove(id);
        Ok(())
    }
}

/// Open, configure and integrity-check the database at `path`.
fn open_checked(path: &Path) -> std::result::Result<Connection, OpenFailure> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    match recovery::integrity_check(&conn)? {
        None => Ok(conn),
        Some(problems) => Err(OpenFailure::Corrupt(problems)),
    }
}

/// Quarantine the file at `path` and open a fresh database there.
///
/// Single attempt: any failure here is reported as corruption.
fn recover<Q>(path: &Path, quarantine: Q) -> Result<(Connection, PathBuf)>
where
    Q: FnOnce(&Path) -> Result<PathBuf>,
{
    let corrupted = |reason: String| StoreError::StorageCorrupted {
        path: path.to_path_buf(),
        reason,
    };

    let moved = quarantine(path)
        .map_err(|e| corrupted(format!("could not move corrupted database aside: {}", e)))?;

    match open_checked(path) {
        Ok(conn) => Ok((conn, moved)),
        Err(OpenFailure::Corrupt(reason)) => Err(corrupted(reason)),
        Err(OpenFailure::Other(err)) => Err(corrupted(err.to_string())),
    }
}

fn load_refs(conn: &Connection, collection: Collection) -> Result<ParsedRefs> {
    let mut stmt = conn.prepare(&format!("SELECT station_uuid FROM {}", collection.table()))?;
    let rows = stmt.query_map([], |row| row.get::<_, Value>(0))?;

    let mut parsed = ParsedRefs::new();
    for row in rows {
        match row? {
            Value::Text(text) => parsed.push(&text),
            _ => parsed.discarded += 1,
        }
    }

    if parsed.discarded > 0 {
        debug!(table = collection.table(), discarded = parsed.discarded, "skipped malformed station ids");
    }
    Ok(parsed)
}

fn load_last_vote(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
    let value: Option<Value> = conn
        .query_row("SELECT voted_at FROM last_vote WHERE id = 1", [], |row| row.get(0))
        .optional()?;

    let Some(Value::Text(text)) = value else {
        return Ok(None);
    };

    match DateTime::parse_from_rfc3339(&text) {
        Ok(at) => Ok(Some(at.with_timezone(&Utc))),
        Err(e) => {
            debug!(value = %text, error = %e, "ignoring malformed vote timestamp");
            Ok(None)
        }
    }
}

/// Rewrite rows holding a valid but non-canonical id (uppercase, braced,
/// unhyphenated) to the canonical hyphenated form. Statements match on the
/// canonical text, so a row left as-is could never be removed.
fn canonicalize_refs(conn: &mut Connection, collection: Collection) -> Result<usize> {
    let table = collection.table();
    let stale: Vec<(String, String)> = {
        let mut stmt = conn.prepare(&format!("SELECT station_uuid FROM {table}"))?;
        let rows = stmt.query_map([], |row| row.get::<_, Value>(0))?;
        let mut stale = Vec::new();
        for row in rows {
            if let Value::Text(text) = row? {
                if let Ok(id) = StationRef::parse(&text) {
                    let canonical = id.to_string();
                    if canonical != text {
                        stale.push((text, canonical));
                    }
                }
            }
        }
        stale
    };

    if stale.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    {
        let mut update = tx.prepare(&format!(
            "UPDATE OR IGNORE {table} SET station_uuid = ?2 WHERE station_uuid = ?1"
        ))?;
        let mut delete = tx.prepare(&format!("DELETE FROM {table} WHERE station_uuid = ?1"))?;
        for (raw, canonical) in &stale {
            update.execute(params![raw, canonical])?;
            // Still present when the canonical id already had a row.
            delete.execute(params![raw])?;
        }
    }
    tx.commit()?;

    debug!(table, rewritten = stale.len(), "canonicalized station ids");
    Ok(stale.len())
}

fn load_cache(conn: &mut Connection) -> Result<StationCache> {
    let mut cache = StationCache::default();
    for collection in Collection::ALL {
        canonicalize_refs(conn, collection)?;
        *cache.set_mut(collection) = load_refs(conn, collection)?.into_refs();
    }
    cache.last_vote = load_last_vote(conn)?;
    Ok(cache)
}

fn now_rfc3339() -> String {
    format_timestamp(Utc::now())
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// RFC 3339 only has four-digit years; anything outside would be written
/// but could not be read back.
fn check_vote_timestamp(at: DateTime<Utc>) -> Result<()> {
    if (0..=9999).contains(&at.year()) {
        Ok(())
    } else {
        Err(StoreError::TimestampOutOfRange(at))
    }
}

impl StationStore for SqliteStore {
    fn get_bookmarks(&self) -> Vec<StationRef> {
        cache::read(&self.cache).list(Collection::Bookmarks)
    }

    fn add_bookmark(&self, id: &StationRef) -> Result<()> {
        self.insert(Collection::Bookmarks, id)
    }

    fn remove_bookmark(&self, id: &StationRef) -> Result<()> {
        self.remove(Collection::Bookmarks, id)
    }

    fn is_bookmarked(&self, id: &StationRef) -> bool {
        cache::read(&self.cache).contains(Collection::Bookmarks, id)
    }

    fn get_hidden(&self) -> Vec<StationRef> {
        cache::read(&self.cache).list(Collection::Hidden)
    }

    fn add_hidden(&self, id: &StationRef) -> Result<()> {
        self.insert(Collection::Hidden, id)
    }

    fn remove_hidden(&self, id: &StationRef) -> Result<()> {
        self.remove(Collection::Hidden, id)
    }

    fn is_hidden(&self, id: &StationRef) -> bool {
        cache::read(&self.cache).contains(Collection::Hidden, id)
    }

    fn as_vote_store(&self) -> Option<&dyn VoteStore> {
        Some(self)
    }

    fn close(&self) -> Result<()> {
        let _cache = cache::write(&self.cache);
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        match conn.take() {
            Some(conn) => conn.close().map_err(|(_, err)| StoreError::from(err)),
            None => Ok(()),
        }
    }
}

impl VoteStore for SqliteStore {
    fn get_last_vote_timestamp(&self) -> Option<DateTime<Utc>> {
        cache::read(&self.cache).last_vote
    }

    fn set_last_vote_timestamp(&self, at: DateTime<Utc>) -> Result<()> {
        check_vote_timestamp(at)?;
        let mut cache = cache::write(&self.cache);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO last_vote (id, voted_at) VALUES (1, ?1)
                 ON CONFLICT(id) DO UPDATE SET voted_at = excluded.voted_at",
                params![format_timestamp(at)],
            )?;
            Ok(())
        })?;
        cache.last_vote = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    const A: &str = "96062a7b-0601-11e8-ae97-52543be04c81";

    fn id(s: &str) -> StationRef {
        s.parse().unwrap()
    }

    fn row_count(store: &SqliteStore, table: &str) -> i64 {
        store
            .with_conn(|conn| {
                Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?)
            })
            .unwrap()
    }

    #[test]
    fn test_add_and_query() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_bookmark(&id(A)).unwrap();

        assert!(store.is_bookmarked(&id(A)));
        assert!(!store.is_hidden(&id(A)));
        assert_eq!(store.get_bookmarks(), vec![id(A)]);
        assert_eq!(row_count(&store, "bookmarks"), 1);
    }

    #[test]
    fn test_idempotent_insert_keeps_one_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_hidden(&id(A)).unwrap();
        store.add_hidden(&id(A)).unwrap();

        assert_eq!(store.get_hidden().len(), 1);
        assert_eq!(row_count(&store, "hidden"), 1);
    }

    #[test]
    fn test_vote_timestamp_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get_last_vote_timestamp(), None);

        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        store.set_last_vote_timestamp(local.with_timezone(&Utc)).unwrap();

        let got = store.get_last_vote_timestamp().unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap());
        assert_eq!(row_count(&store, "last_vote"), 1);
    }

    #[test]
    fn test_vote_timestamp_accepts_out_of_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();

        store.set_last_vote_timestamp(later).unwrap();
        store.set_last_vote_timestamp(earlier).unwrap();
        assert_eq!(store.get_last_vote_timestamp(), Some(earlier));
        assert_eq!(row_count(&store, "last_vote"), 1);
    }

    #[test]
    fn test_subsecond_precision_survives() {
        let tmp = tempfile::tempdir().unwrap();
        let at = Utc.timestamp_opt(1_717_243_200, 123_456_789).unwrap();
        {
            let store = SqliteStore::open(tmp.path()).unwrap();
            store.set_last_vote_timestamp(at).unwrap();
            store.close().unwrap();
        }
        let store = SqliteStore::open(tmp.path()).unwrap();
        assert_eq!(store.get_last_vote_timestamp(), Some(at));
    }

    #[test]
    fn test_close_twice_is_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.close().unwrap();
        store.close().unwrap();
        assert!(store.is_closed());
    }

    #[test]
    fn test_write_after_close_fails_without_cache_change() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.close().unwrap();

        let err = store.add_bookmark(&id(A)).unwrap_err();
        assert!(matches!(err, StoreError::Closed));
        assert!(!store.is_bookmarked(&id(A)));
    }

    #[test]
    fn test_failed_statement_leaves_cache_untouched() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER no_hidden BEFORE INSERT ON hidden
                     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                )?;
                Ok(())
            })
            .unwrap();

        let err = store.add_hidden(&id(A)).unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(!store.is_hidden(&id(A)));
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = SqliteStore::open(tmp.path()).unwrap();
            store.add_bookmark(&id(A)).unwrap();
            store
                .with_conn(|conn| {
                    conn.execute_batch(
                        "INSERT INTO bookmarks VALUES ('garbage', NULL);
                         INSERT INTO bookmarks VALUES (42, NULL);
                         INSERT INTO last_vote VALUES (1, 'last tuesday');",
                    )?;
                    Ok(())
                })
                .unwrap();
            store.close().unwrap();
        }

        let store = SqliteStore::open(tmp.path()).unwrap();
        assert_eq!(store.get_bookmarks(), vec![id(A)]);
        assert_eq!(store.get_last_vote_timestamp(), None);
    }

    #[test]
    fn test_wal_mode_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(tmp.path()).unwrap();
        let mode: String = store
            .with_conn(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(store.path(), Some(tmp.path().join("radiogogo.db").as_path()));
    }

    #[test]
    fn test_corrupted_file_recovered_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("radiogogo.db");
        std::fs::write(&path, "definitely not sqlite\n".repeat(512)).unwrap();

        let store = SqliteStore::open(tmp.path()).unwrap();
        let moved = store.recovered_from().unwrap().to_path_buf();
        assert!(moved.exists());
        assert!(store.get_bookmarks().is_empty());

        store.add_bookmark(&id(A)).unwrap();
        store.close().unwrap();

        let reopened = SqliteStore::open(tmp.path()).unwrap();
        assert!(reopened.recovered_from().is_none());
        assert!(reopened.is_bookmarked(&id(A)));
    }

    #[test]
    fn test_non_canonical_rows_rewritten_on_open() {
        const B: &str = "f2e2b1a0-8c1d-4b5e-9f3a-0d4c5b6a7e8f";
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = SqliteStore::open(tmp.path()).unwrap();
            store
                .with_conn(|conn| {
                    conn.execute(
                        "INSERT INTO bookmarks VALUES (?1, NULL), (?2, NULL), (?3, NULL)",
                        params![
                            A.to_uppercase(),
                            format!("{{{A}}}"),
                            B.replace('-', ""),
                        ],
                    )?;
                    Ok(())
                })
                .unwrap();
            store.close().unwrap();
        }

        let store = SqliteStore::open(tmp.path()).unwrap();
        assert!(store.is_bookmarked(&id(A)));
        assert!(store.is_bookmarked(&id(B)));
        assert_eq!(row_count(&store, "bookmarks"), 2);

        store.remove_bookmark(&id(A)).unwrap();
        store.add_bookmark(&id(B)).unwrap();
        assert_eq!(row_count(&store, "bookmarks"), 1);
        store.close().unwrap();

        let store = SqliteStore::open(tmp.path()).unwrap();
        assert!(!store.is_bookmarked(&id(A)));
        assert_eq!(store.get_bookmarks(), vec![id(B)]);
    }

    #[test]
    fn test_vote_timestamp_outside_rfc3339_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let kept = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let too_late = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let too_early = Utc.with_ymd_and_hms(-1, 12, 31, 23, 59, 59).unwrap();
        {
            let store = SqliteStore::open(tmp.path()).unwrap();
            store.set_last_vote_timestamp(kept).unwrap();

            for at in [too_late, too_early] {
                let err = store.set_last_vote_timestamp(at).unwrap_err();
                assert!(matches!(err, StoreError::TimestampOutOfRange(t) if t == at));
            }
            assert_eq!(store.get_last_vote_timestamp(), Some(kept));
            store.close().unwrap();
        }

        let store = SqliteStore::open(tmp.path()).unwrap();
        assert_eq!(store.get_last_vote_timestamp(), Some(kept));
    }

    #[test]
    fn test_vote_timestamp_year_bounds_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let first = Utc.with_ymd_and_hms(0, 1, 1, 0, 0, 0).unwrap();
        let last = Utc.timestamp_opt(253_402_300_799, 999_999_999).unwrap();

        for at in [first, last] {
            {
                let store = SqliteStore::open(tmp.path()).unwrap();
                store.set_last_vote_timestamp(at).unwrap();
                store.close().unwrap();
            }
            let store = SqliteStore::open(tmp.path()).unwrap();
            assert_eq!(store.get_last_vote_timestamp(), Some(at));
        }
    }

    #[test]
    fn test_recovery_fails_when_quarantine_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("radiogogo.db");
        std::fs::write(&path, "definitely not sqlite\n".repeat(512)).unwrap();

        let err = recover(&path, |p| {
            Err(StoreError::fs(p, std::io::Error::from(std::io::ErrorKind::PermissionDenied)))
        })
        .map(|_| ())
        .unwrap_err();

        assert!(matches!(err, StoreError::StorageCorrupted { .. }));
        assert!(path.exists());
    }

    #[test]
    fn test_recovery_fails_when_fresh_database_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("radiogogo.db");
        std::fs::write(&path, "definitely not sqlite\n".repeat(512)).unwrap();

        // Report success without moving anything, so the reopen sees the same file.
        let err = recover(&path, |p| Ok(p.to_path_buf())).map(|_| ()).unwrap_err();

        match err {
            StoreError::StorageCorrupted { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected StorageCorrupted, got {other:?}"),
        }
    }
}
