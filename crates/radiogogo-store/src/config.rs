//! Storage location and backend selection.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Application name, used for the per-user config directory.
pub const APP_NAME: &str = "radiogogo";

/// Flat-file backend: bookmarked stations.
pub const BOOKMARKS_FILE: &str = "bookmarks.txt";

/// Flat-file backend: hidden stations.
pub const HIDDEN_FILE: &str = "hidden.txt";

/// SQLite backend database file.
pub const DATABASE_FILE: &str = "radiogogo.db";

/// Which backend holds the preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Plain-text files, one identifier per line.
    FlatFile,
    /// Embedded SQLite database.
    #[default]
    Sqlite,
}

/// Configuration for opening a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to open.
    pub backend: Backend,
    /// Storage directory. `None` means the platform config directory.
    pub dir: Option<PathBuf>,
    /// Import `bookmarks.txt` / `hidden.txt` into a SQLite store on open.
    pub import_legacy: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            dir: None,
            import_legacy: true,
        }
    }
}

impl StoreConfig {
    /// Use `backend` at the platform default location.
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Override the storage directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// The directory the store lives in.
    pub fn resolve_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => default_dir(),
        }
    }
}

/// The per-user config directory, e.g. `~/.config/radiogogo`.
pub fn default_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| {
            StoreError::Config(
                "could not determine config directory; HOME may not be set".to_string(),
            )
        })
}

/// Create `dir` (and parents) if missing. New directories are owner-only.
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir).map_err(|e| StoreError::fs(dir, e))
}
