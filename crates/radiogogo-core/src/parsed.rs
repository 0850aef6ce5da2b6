//! Lenient bulk parsing of persisted identifiers.
//!
//! Persisted collections are parsed entry by entry; an entry that is not a
//! valid identifier is counted and dropped so one bad line or row never
//! prevents the rest of a collection from loading.

use std::collections::HashSet;

use crate::types::StationRef;

/// The result of parsing a batch of textual identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRefs {
    /// Every distinct identifier that parsed.
    pub refs: HashSet<StationRef>,
    /// Non-blank entries that failed to parse.
    pub discarded: usize,
}

impl ParsedRefs {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse newline-separated text. Blank lines are ignored and not counted.
    pub fn from_lines(text: &str) -> Self {
        text.lines().collect()
    }

    /// Parse one entry into the batch.
    pub fn push(&mut self, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        match StationRef::parse(raw) {
            Ok(id) => {
                self.refs.insert(id);
            }
            Err(_) => self.discarded += 1,
        }
    }

    /// Number of distinct valid identifiers.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Whether no valid identifier was found.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Take the identifier set, dropping the discard count.
    pub fn into_refs(self) -> HashSet<StationRef> {
        self.refs
    }
}

impl<S: AsRef<str>> Extend<S> for ParsedRefs {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for raw in iter {
            self.push(raw.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for ParsedRefs {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut parsed = Self::new();
        parsed.extend(iter);
        parsed
    }
}
