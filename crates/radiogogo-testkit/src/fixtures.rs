//! Test fixtures and helpers.
//!
//! Common setup code for store tests: a temporary storage directory that can
//! open either backend, plus builders for on-disk states that are awkward to
//! reach through the public API (old schema versions, corrupted files).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use radiogogo_core::StationRef;
use radiogogo_store::config::DATABASE_FILE;
use radiogogo_store::migration::{self, SCHEMA_V1};
use radiogogo_store::recovery::CORRUPTED_MARKER;
use radiogogo_store::{FlatFileStore, SqliteStore};
use rusqlite::{params, Connection};
use tempfile::TempDir;

/// Deterministic station id `n`, for readable test data.
pub fn station(n: u8) -> StationRef {
    let mut bytes = [0u8; 16];
    bytes[15] = n;
    bytes[6] = 0x40; // version 4
    bytes[8] = 0x80; // RFC 4122 variant
    StationRef::from_bytes(bytes)
}

/// A temporary storage directory, deleted on drop.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// The directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the directory.
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.join(DATABASE_FILE)
    }

    /// Open the flat-file backend here.
    pub fn open_flat(&self) -> FlatFileStore {
        FlatFileStore::open(self.path()).expect("open flat-file store")
    }

    /// Open the SQLite backend here.
    pub fn open_sqlite(&self) -> SqliteStore {
        SqliteStore::open(self.path()).expect("open sqlite store")
    }

    /// Write `content` to `name`.
    pub fn write(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, content).expect("write fixture file");
        path
    }

    /// Read `name` as text.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).expect("read fixture file")
    }

    /// Put a file that is not a SQLite database where the database belongs.
    pub fn write_garbage_database(&self) -> PathBuf {
        self.write(DATABASE_FILE, "radiogogo: not a database\n".repeat(512))
    }

    /// Every quarantined `*.corrupted.*` file in the directory.
    pub fn corrupted_artifacts(&self) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(self.path())
            .expect("list fixture dir")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().contains(CORRUPTED_MARKER))
                    .unwrap_or(false)
            })
            .collect();
        found.sort();
        found
    }

    /// Build a database as an older release left it, at schema `version`.
    ///
    /// Starts from the version 1 layout (per-station vote log) and applies
    /// the real migration steps up to `version`.
    pub fn legacy_database(&self, version: u32, data: &LegacyData) -> PathBuf {
        let path = self.database_path();
        let mut conn = Connection::open(&path).expect("open legacy db");
        conn.execute_batch(SCHEMA_V1).expect("create v1 schema");
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER PRIMARY KEY);
             INSERT INTO schema_version (version) VALUES (1);",
        )
        .expect("stamp v1");

        for id in &data.bookmarks {
            conn.execute(
                "INSERT INTO bookmarks (station_uuid, created_at) VALUES (?1, NULL)",
                params![id.to_string()],
            )
            .expect("insert bookmark");
        }
        for id in &data.hidden {
            conn.execute(
                "INSERT INTO hidden (station_uuid, created_at) VALUES (?1, NULL)",
                params![id.to_string()],
            )
            .expect("insert hidden");
        }
        for (id, at) in &data.votes {
            conn.execute(
                "INSERT INTO station_votes (station_uuid, voted_at) VALUES (?1, ?2)",
                params![id.to_string(), at.to_rfc3339_opts(SecondsFormat::AutoSi, true)],
            )
            .expect("insert vote");
        }
        for raw in &data.raw_bookmarks {
            conn.execute(
                "INSERT INTO bookmarks (station_uuid, created_at) VALUES (?1, NULL)",
                params![raw],
            )
            .expect("insert raw bookmark");
        }

        if version > 1 {
            migration::migrate_to(&mut conn, version).expect("migrate legacy db");
        }
        path
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Rows for [`TestDir::legacy_database`].
#[derive(Debug, Clone, Default)]
pub struct LegacyData {
    pub bookmarks: Vec<StationRef>,
    pub hidden: Vec<StationRef>,
    /// Per-station votes from the version 1 vote log.
    pub votes: Vec<(StationRef, DateTime<Utc>)>,
    /// Bookmark values written verbatim, e.g. malformed ids.
    pub raw_bookmarks: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use radiogogo_store::StationStore;

    #[test]
    fn test_station_ids_are_distinct_and_valid() {
        assert_ne!(station(1), station(2));
        let text = station(7).to_string();
        assert_eq!(text.parse::<StationRef>().unwrap(), station(7));
        assert_eq!(station(7).as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_legacy_database_version() {
        let dir = TestDir::new();
        let path = dir.legacy_database(2, &LegacyData::default());
        let conn = Connection::open(path).unwrap();
        assert_eq!(migration::schema_version(&conn).unwrap(), Some(2));
    }

    #[test]
    fn test_garbage_database_is_recovered() {
        let dir = TestDir::new();
        dir.write_garbage_database();
        assert!(dir.corrupted_artifacts().is_empty());

        let store = dir.open_sqlite();
        assert!(store.get_bookmarks().is_empty());
        assert_eq!(dir.corrupted_artifacts().len(), 1);
    }
}
