//! # Radiogogo Store
//!
//! Persistent station preferences for radiogogo. Records which stations the
//! user has bookmarked, which are hidden from search results, and when the
//! user last voted for a station.
//!
//! ## Overview
//!
//! Preferences sit behind the [`StationStore`] trait so the UI never knows
//! which backend is active. Two backends implement it:
//!
//! - [`FlatFileStore`] - `bookmarks.txt` / `hidden.txt`, one UUID per line
//! - [`SqliteStore`] - `radiogogo.db` with versioned schema, corruption
//!   recovery and vote timestamp tracking ([`VoteStore`])
//!
//! Both keep an in-memory cache behind a reader/writer lock, so membership
//! tests and enumeration never touch the disk.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use radiogogo_core::StationRef;
//! use radiogogo_store::{open_store, StoreConfig};
//!
//! let store = open_store(&StoreConfig::default()).unwrap();
//! let id = StationRef::new_v4();
//!
//! store.add_bookmark(&id).unwrap();
//! assert!(store.is_bookmarked(&id));
//!
//! if let Some(votes) = store.as_vote_store() {
//!     votes.set_last_vote_timestamp(chrono::Utc::now()).unwrap();
//! }
//! store.close().unwrap();
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent mutations**: adding twice or removing an absent id is not an error
//! - **Write ordering**: the flat-file backend updates its cache before the
//!   file rewrite; the SQLite backend updates its cache only after the
//!   statement succeeds
//! - **Lossy self-healing**: malformed entries are skipped on load
//! - **Recovery**: a corrupted database is renamed aside once, never deleted

pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod flatfile;
pub mod legacy;
pub mod migration;
pub mod recovery;
pub mod sqlite;
pub mod traits;

pub use cache::Collection;
pub use config::{default_dir, Backend, StoreConfig};
pub use error::{Result, StoreError};
pub use factory::open_store;
pub use flatfile::FlatFileStore;
pub use legacy::ImportReport;
pub use migration::CURRENT_SCHEMA_VERSION;
pub use sqlite::SqliteStore;
pub use traits::{StationStore, VoteStore};
