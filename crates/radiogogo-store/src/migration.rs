//! Database schema migrations for SQLite.
//!
//! The schema version lives in a single-row `schema_version` table. A fresh
//! database is created directly at [`CURRENT_SCHEMA_VERSION`]; an older one
//! is brought forward by the steps in [`MIGRATIONS`], each applied in its own
//! transaction together with its version bump. Steps only add or retire
//! tables and are written to be safe to re-run. `bookmarks` and `hidden`
//! are never touched by a step.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::debug;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Schema of version 1 databases, which logged every vote per station.
///
/// Fresh installs never create it; it is kept to document what the
/// migration steps start from and to build upgrade fixtures.
pub const SCHEMA_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS bookmarks (
        station_uuid TEXT PRIMARY KEY,
        created_at TEXT
    );

    CREATE TABLE IF NOT EXISTS hidden (
        station_uuid TEXT PRIMARY KEY,
        created_at TEXT
    );

    CREATE TABLE IF NOT EXISTS station_votes (
        station_uuid TEXT PRIMARY KEY,
        voted_at TEXT
    );
"#;

const SCHEMA_CURRENT: &str = r#"
    CREATE TABLE IF NOT EXISTS bookmarks (
        station_uuid TEXT PRIMARY KEY,
        created_at TEXT
    );

    CREATE TABLE IF NOT EXISTS hidden (
        station_uuid TEXT PRIMARY KEY,
        created_at TEXT
    );

    -- Singleton: the most recent vote cast by this user
    CREATE TABLE IF NOT EXISTS last_vote (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        voted_at TEXT
    );
"#;

/// One incremental schema step.
pub struct Migration {
    /// Version recorded once the step is applied.
    pub version: u32,
    pub description: &'static str,
    apply: fn(&Transaction<'_>) -> Result<()>,
}

/// Ordered migration steps, keyed by the version they produce.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 2,
        description: "introduce last_vote singleton",
        apply: apply_v2,
    },
    Migration {
        version: 3,
        description: "retire station_votes",
        apply: apply_v3,
    },
];

/// Initialize or migrate the database schema to [`CURRENT_SCHEMA_VERSION`].
///
/// This function is idempotent - it can be called on every open.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    migrate_to(conn, CURRENT_SCHEMA_VERSION)
}

/// Apply pending steps up to and including `target`.
///
/// A database without a version row is fresh and always installed at
/// [`CURRENT_SCHEMA_VERSION`], whatever `target` is.
pub fn migrate_to(conn: &mut Connection, target: u32) -> Result<()> {
    if target > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "unknown target version: {}",
            target
        )));
    }

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        [],
    )?;

    let Some(current) = schema_version(conn)? else {
        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA_CURRENT)?;
        record_version(&tx, CURRENT_SCHEMA_VERSION)?;
        tx.commit()?;
        debug!(version = CURRENT_SCHEMA_VERSION, "created fresh schema");
        return Ok(());
    };

    if current > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_SCHEMA_VERSION
        )));
    }

    for step in MIGRATIONS
        .iter()
        .filter(|m| m.version > current && m.version <= target)
    {
        let tx = conn.transaction()?;
        (step.apply)(&tx)?;
        record_version(&tx, step.version)?;
        tx.commit()?;
        debug!(version = step.version, description = step.description, "applied migration");
    }

    Ok(())
}

/// The recorded schema version, or `None` for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<Option<u32>> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version)
}

fn record_version(tx: &Transaction<'_>, version: u32) -> Result<()> {
    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        params![version],
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Migration v2: the cooldown only needs the latest vote, seeded from the
/// per-station log.
fn apply_v2(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS last_vote (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            voted_at TEXT
        );
        "#,
    )?;

    if !table_exists(tx, "station_votes")? {
        return Ok(());
    }

    let latest = {
        let mut stmt = tx.prepare("SELECT voted_at FROM station_votes")?;
        let rows = stmt.query_map([], |row| row.get::<_, Option<String>>(0))?;
        let mut latest: Option<DateTime<Utc>> = None;
        for row in rows {
            let parsed = row?
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|t| t.with_timezone(&Utc));
            latest = latest.max(parsed);
        }
        latest
    };

    if let Some(at) = latest {
        tx.execute(
            "INSERT OR IGNORE INTO last_vote (id, voted_at) VALUES (1, ?1)",
            params![at.to_rfc3339_opts(SecondsFormat::AutoSi, true)],
        )?;
    }
    Ok(())
}

/// Migration v3: per-station votes are no longer read.
fn apply_v3(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch("DROP TABLE IF EXISTS station_votes;")?;
    Ok(())
}
