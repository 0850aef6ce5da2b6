//! Flat-file implementation of the StationStore trait.
//!
//! Each collection is a text file with one canonical UUID per line. Every
//! mutation rewrites the whole file through a temporary file and an atomic
//! rename, so a failed write never leaves a truncated file behind.
//!
//! The cache is updated *before* the file is rewritten. If the rewrite fails
//! the error is returned but the cache keeps the change; the next successful
//! write of that collection reconciles the file. Callers treat an error as
//! "state may differ from disk, retry or reopen".

use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use radiogogo_core::{ParsedRefs, StationRef};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::cache::{self, Collection, StationCache};
use crate::config::ensure_dir;
use crate::error::{Result, StoreError};
use crate::traits::StationStore;

/// Flat-file store implementation.
///
/// Thread-safe via RwLock. No vote-timestamp support.
pub struct FlatFileStore {
    dir: PathBuf,
    cache: RwLock<StationCache>,
}

impl FlatFileStore {
    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// Missing files load as empty collections.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        ensure_dir(&dir)?;

        let mut cache = StationCache::default();
        for collection in Collection::ALL {
            *cache.set_mut(collection) = load_file(&dir.join(collection.file_name()))?.into_refs();
        }

        Ok(Self {
            dir,
            cache: RwLock::new(cache),
        })
    }

    /// Directory holding the backing files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(collection.file_name())
    }

    fn insert(&self, collection: Collection, id: &StationRef) -> Result<()> {
        let mut cache = cache::write(&self.cache);
        cache.set_mut(collection).insert(*id);
        write_file(&self.path(collection), cache.set(collection))
    }

    fn remove(&self, collection: Collection, id: &StationRef) -> Result<()> {
        let mut cache = cache::write(&self.cache);
        cache.set_mut(collection).remove(id);
        write_file(&self.path(collection), cache.set(collection))
    }
}

/// Load identifiers from `path`. A missing file is an empty collection.
///
/// Invalid UTF-8 is replaced rather than rejected; the affected lines fail to
/// parse and are counted as discarded.
pub(crate) fn load_file(path: &Path) -> Result<ParsedRefs> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ParsedRefs::new()),
        Err(e) => return Err(StoreError::fs(path, e)),
    };

    let parsed = ParsedRefs::from_lines(&String::from_utf8_lossy(&bytes));
    if parsed.discarded > 0 {
        debug!(path = %path.display(), discarded = parsed.discarded, "skipped malformed station ids");
    }
    Ok(parsed)
}

/// Replace `path` with `ids`, sorted, one per line.
pub(crate) fn write_file(path: &Path, ids: &HashSet<StationRef>) -> Result<()> {
    let mut sorted: Vec<&StationRef> = ids.iter().collect();
    sorted.sort();

    let mut content = String::with_capacity(sorted.len() * 37);
    for id in sorted {
        content.push_str(&id.to_string());
        content.push('\n');
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::fs(dir, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StoreError::fs(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| StoreError::fs(path, e.error))?;
    Ok(())
}

impl StationStore for FlatFileStore {
    fn get_bookmarks(&self) -> Vec<StationRef> {
        cache::read(&self.cache).list(Collection::Bookmarks)
    }

    fn add_bookmark(&self, id: &StationRef) -> Result<()> {
        self.insert(Collection::Bookmarks, id)
    }

    fn remove_bookmark(&self, id: &StationRef) -> Result<()> {
        self.remove(Collection::Bookmarks, id)
    }

    fn is_bookmarked(&self, id: &StationRef) -> bool {
        cache::read(&self.cache).contains(Collection::Bookmarks, id)
    }

    fn get_hidden(&self) -> Vec<StationRef> {
        cache::read(&self.cache).list(Collection::Hidden)
    }

    fn add_hidden(&self, id: &StationRef) -> Result<()> {
        self.insert(Collection::Hidden, id)
    }

    fn remove_hidden(&self, id: &StationRef) -> Result<()> {
        self.remove(Collection::Hidden, id)
    }

    fn is_hidden(&self, id: &StationRef) -> bool {
        cache::read(&self.cache).contains(Collection::Hidden, id)
    }
}
