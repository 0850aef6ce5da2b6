//! Import of flat-file preferences into the SQLite backend.
//!
//! Users switching from the flat-file backend keep their bookmarks and
//! hidden stations: `bookmarks.txt` and `hidden.txt` are read, inserted,
//! and renamed to `*.migrated` so the import runs only once.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::cache::Collection;
use crate::error::{Result, StoreError};
use crate::flatfile::load_file;
use crate::sqlite::SqliteStore;

/// Suffix appended to flat files once imported.
pub const MIGRATED_SUFFIX: &str = ".migrated";

/// Outcome of [`SqliteStore::import_flat_files`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Bookmarks read from `bookmarks.txt`.
    pub bookmarks: usize,
    /// Hidden stations read from `hidden.txt`.
    pub hidden: usize,
    /// Lines that were not valid identifiers.
    pub discarded: usize,
}

impl ImportReport {
    /// Whether no flat file contributed anything.
    pub fn is_empty(&self) -> bool {
        self.bookmarks == 0 && self.hidden == 0 && self.discarded == 0
    }
}

impl SqliteStore {
    /// Import `bookmarks.txt` / `hidden.txt` from `dir`.
    ///
    /// Missing files are skipped. Each imported file is renamed to
    /// `<name>.migrated` after its rows are committed. Ids already present
    /// are left as they are.
    pub fn import_flat_files(&self, dir: impl AsRef<Path>) -> Result<ImportReport> {
        let dir = dir.as_ref();
        let mut report = ImportReport::default();

        for collection in Collection::ALL {
            let path = dir.join(collection.file_name());
            if !path.is_file() {
                continue;
            }

            let parsed = load_file(&path)?;
            self.insert_many(collection, &parsed.refs)?;

            let mut migrated = path.as_os_str().to_os_string();
            migrated.push(MIGRATED_SUFFIX);
            fs::rename(&path, &migrated).map_err(|e| StoreError::fs(&path, e))?;

            info!(
                file = collection.file_name(),
                imported = parsed.len(),
                discarded = parsed.discarded,
                "imported legacy station list"
            );

            report.discarded += parsed.discarded;
            match collection {
                Collection::Bookmarks => report.bookmarks = parsed.len(),
                Collection::Hidden => report.hidden = parsed.len(),
            }
        }

        Ok(report)
    }
}
