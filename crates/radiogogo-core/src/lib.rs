//! # Radiogogo Core
//!
//! Core primitives shared by the radiogogo station directory client, the
//! terminal UI and the preference store.
//!
//! ## Key Types
//!
//! - [`StationRef`] - 128-bit station identifier (UUID)
//! - [`ParsedRefs`] - Lenient bulk parse result: valid identifiers plus a discard count
//! - [`CoreError`] - Identifier parse failures
//!
//! ## Usage
//!
//! ```rust
//! use radiogogo_core::{ParsedRefs, StationRef};
//!
//! let id: StationRef = "96062a7b-0601-11e8-ae97-52543be04c81".parse().unwrap();
//! assert_eq!(id.to_string(), "96062a7b-0601-11e8-ae97-52543be04c81");
//!
//! let parsed = ParsedRefs::from_lines("96062a7b-0601-11e8-ae97-52543be04c81\nnot-a-uuid\n\n");
//! assert_eq!(parsed.len(), 1);
//! assert_eq!(parsed.discarded, 1);
//! ```

pub mod error;
pub mod parsed;
pub mod types;
pub mod vote;

pub use error::{CoreError, Result};
pub use parsed::ParsedRefs;
pub use types::StationRef;
pub use vote::{cooldown_remaining, VOTE_COOLDOWN};
