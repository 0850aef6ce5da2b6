//! Opening the configured backend.

use tracing::info;

use crate::config::{Backend, StoreConfig};
use crate::error::Result;
use crate::flatfile::FlatFileStore;
use crate::sqlite::SqliteStore;
use crate::traits::StationStore;

/// Open the backend selected by `config`.
///
/// For SQLite with `import_legacy` set, flat files left in the directory by
/// the flat-file backend are imported first.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn StationStore>> {
    let dir = config.resolve_dir()?;

    match config.backend {
        Backend::FlatFile => Ok(Box::new(FlatFileStore::open(&dir)?)),
        Backend::Sqlite => {
            let store = SqliteStore::open(&dir)?;
            if config.import_legacy {
                let report = store.import_flat_files(&dir)?;
                if !report.is_empty() {
                    info!(
                        bookmarks = report.bookmarks,
                        hidden = report.hidden,
                        "migrated flat-file preferences to database"
                    );
                }
            }
            Ok(Box::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radiogogo_core::StationRef;

    #[test]
    fn test_flat_file_backend_has_no_votes() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(Backend::FlatFile).with_dir(tmp.path());
        let store = open_store(&config).unwrap();
        assert!(store.as_vote_store().is_none());
    }

    #[test]
    fn test_sqlite_backend_has_votes() {
        let tmp = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(Backend::Sqlite).with_dir(tmp.path());
        let store = open_store(&config).unwrap();
        assert!(store.as_vote_store().is_some());
        assert!(tmp.path().join("radiogogo.db").exists());
    }

    #[test]
    fn test_switching_backend_keeps_bookmarks() {
        let tmp = tempfile::tempdir().unwrap();
        let id = StationRef::new_v4();

        let flat = open_store(&StoreConfig::new(Backend::FlatFile).with_dir(tmp.path())).unwrap();
        flat.add_bookmark(&id).unwrap();
        flat.close().unwrap();

        let db = open_store(&StoreConfig::new(Backend::Sqlite).with_dir(tmp.path())).unwrap();
        assert!(db.is_bookmarked(&id));
    }

    #[test]
    fn test_import_can_be_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let id = StationRef::new_v4();
        std::fs::write(tmp.path().join("bookmarks.txt"), format!("{id}\n")).unwrap();

        let mut config = StoreConfig::new(Backend::Sqlite).with_dir(tmp.path());
        config.import_legacy = false;
        let store = open_store(&config).unwrap();

        assert!(!store.is_bookmarked(&id));
        assert!(tmp.path().join("bookmarks.txt").exists());
    }
}
