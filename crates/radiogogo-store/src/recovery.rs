//! Corruption detection and quarantine for the SQLite backend.
//!
//! A database that fails its integrity check is renamed aside, never
//! deleted, so the data stays available for inspection. Recovery is invoked
//! at most once per open; a database that is still unusable afterwards is a
//! hard failure.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::ffi::ErrorCode;
use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Marker inserted between the original file name and the timestamp.
pub const CORRUPTED_MARKER: &str = ".corrupted.";

/// SQLite sidecar files that belong to a database in WAL mode.
const SIDECARS: [&str; 2] = ["-wal", "-shm"];

/// Run `PRAGMA integrity_check`.
///
/// Returns `None` when the database is healthy, otherwise the reported
/// problems joined into one line.
pub fn integrity_check(conn: &Connection) -> rusqlite::Result<Option<String>> {
    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
    let problems = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if problems.len() == 1 && problems[0] == "ok" {
        Ok(None)
    } else {
        Ok(Some(problems.join("; ")))
    }
}

/// Whether an engine error means the file itself is damaged.
pub fn is_corruption(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    )
}

/// Rename `path` (and any WAL sidecars) to `<name>.corrupted.<timestamp>`.
///
/// Returns the new location of the main database file. The handle on `path`
/// must already be closed.
pub fn quarantine(path: &Path) -> Result<PathBuf> {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S%.6f").to_string();

    let target = corrupted_path(path, &stamp);
    fs::rename(path, &target).map_err(|e| StoreError::fs(path, e))?;

    for suffix in SIDECARS {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        let sidecar = PathBuf::from(name);
        if sidecar.exists() {
            fs::rename(&sidecar, corrupted_path(&sidecar, &stamp))
                .map_err(|e| StoreError::fs(&sidecar, e))?;
        }
    }

    Ok(target)
}

fn corrupted_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name: OsString = path.file_name().unwrap_or_default().to_os_string();
    name.push(CORRUPTED_MARKER);
    name.push(stamp);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_database_passes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER);").unwrap();
        assert_eq!(integrity_check(&conn).unwrap(), None);
    }

    #[test]
    fn test_garbage_file_is_corruption() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("radiogogo.db");
        fs::write(&path, "this is not a database\n".repeat(512)).unwrap();

        let conn = Connection::open(&path).unwrap();
        let err = integrity_check(&conn).unwrap_err();
        assert!(is_corruption(&err));
    }

    #[test]
    fn test_other_errors_are_not_corruption() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        assert!(!is_corruption(&err));
    }

    #[test]
    fn test_quarantine_renames_with_sidecars() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("radiogogo.db");
        fs::write(&path, b"broken").unwrap();
        fs::write(tmp.path().join("radiogogo.db-wal"), b"wal").unwrap();

        let moved = quarantine(&path).unwrap();
        assert!(!path.exists());
        assert!(moved.exists());
        assert_eq!(fs::read(&moved).unwrap(), b"broken");

        let name = moved.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("radiogogo.db.corrupted."));

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with("radiogogo.db-wal.corrupted.")));
        assert!(!tmp.path().join("radiogogo.db-wal").exists());
    }

    #[test]
    fn test_quarantine_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = quarantine(&tmp.path().join("missing.db")).unwrap_err();
        assert!(matches!(err, StoreError::Filesystem { .. }));
    }
}
