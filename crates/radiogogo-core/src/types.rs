//! Strong type definitions for radiogogo.
//!
//! Station identifiers are newtypes over [`Uuid`] so they cannot be confused
//! with other UUID-shaped values the directory client handles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// A 128-bit station identifier, as assigned by the station directory.
///
/// Textual form is the canonical lowercase hyphenated UUID, which is also
/// the form persisted by every store backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationRef(Uuid);

impl StationRef {
    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Generate a random identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse from text. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|source| CoreError::MalformedIdentifier {
                input: input.to_string(),
                source,
            })
    }

    /// The nil identifier (all zero bits).
    pub const NIL: Self = Self(Uuid::nil());
}

impl fmt::Debug for StationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationRef({})", self.0.hyphenated())
    }
}

impl fmt::Display for StationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for StationRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Uuid> for StationRef {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<StationRef> for Uuid {
    fn from(id: StationRef) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SAMPLE: &str = "96062a7b-0601-11e8-ae97-52543be04c81";

    #[test]
    fn test_parse_canonical() {
        let id = StationRef::parse(SAMPLE).unwrap();
        assert_eq!(id.to_string(), SAMPLE);
    }

    #[test]
    fn test_parse_uppercase_normalizes() {
        let id = StationRef::parse(&SAMPLE.to_uppercase()).unwrap();
        assert_eq!(id.to_string(), SAMPLE);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = StationRef::parse(&format!("  {}\r", SAMPLE)).unwrap();
        assert_eq!(id.to_string(), SAMPLE);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "not-a-uuid", "96062a7b-0601-11e8-ae97", "96062a7b-0601-11e8-ae97-52543be04c8z"] {
            let err = StationRef::parse(bad).unwrap_err();
            assert!(matches!(err, CoreError::MalformedIdentifier { .. }), "{bad:?}");
        }
    }

    #[test]
    fn test_error_mentions_input() {
        let err = "garbage".parse::<StationRef>().unwrap_err();
        assert!(err.to_string().contains("garbage"));
    }

    #[test]
    fn test_debug() {
        let debug = format!("{:?}", StationRef::NIL);
        assert_eq!(debug, "StationRef(00000000-0000-0000-0000-000000000000)");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = StationRef::parse(SAMPLE).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", SAMPLE));
    }

    proptest! {
        #[test]
        fn display_parses_back(bytes in any::<[u8; 16]>()) {
            let id = StationRef::from_bytes(bytes);
            prop_assert_eq!(StationRef::parse(&id.to_string()).unwrap(), id);
        }
    }
}
