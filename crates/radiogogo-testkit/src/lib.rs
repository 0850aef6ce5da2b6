//! # Radiogogo Testkit
//!
//! Testing utilities for the radiogogo preference store.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Generators**: Proptest strategies for station ids, timestamps and set operations
//! - **Fixtures**: Temporary storage directories, legacy and corrupted databases
//! - **Conformance**: Checks every [`StationStore`](radiogogo_store::StationStore)
//!   backend must pass, parametrized by an opener
//!
//! ## Conformance
//!
//! ```rust
//! use radiogogo_store::FlatFileStore;
//! use radiogogo_testkit::conformance;
//!
//! let open = |dir: &std::path::Path| FlatFileStore::open(dir).unwrap();
//! conformance::add_then_remove(open);
//! conformance::sets_are_independent(open);
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use radiogogo_store::StationStore;
//! use radiogogo_testkit::fixtures::TestDir;
//!
//! let dir = TestDir::new();
//! let store = dir.open_sqlite();
//! assert!(store.get_bookmarks().is_empty());
//! ```

pub mod conformance;
pub mod fixtures;
pub mod generators;

pub use fixtures::{station, TestDir};
pub use generators::{set_ops, station_ref, station_refs, timestamp, SetOp};
