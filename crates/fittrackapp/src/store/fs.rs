use super::fs_backend::FsBackend;
use super::json_store::JsonStore;
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// The on-disk JSON store rooted at a data directory.
pub type FileStore = JsonStore<FsBackend>;

impl FileStore {
    /// Opens the store at `root`, creating the directory and any missing
    /// document.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = JsonStore::with_backend(FsBackend::new(root));
        store.initialize()?;
        debug!(root = %store.root().display(), "file store opened");
        Ok(store)
    }

    pub fn open_with_max_age(root: impl Into<PathBuf>, max_age: Duration) -> Result<Self> {
        let store = JsonStore::with_backend_and_max_age(FsBackend::new(root), max_age);
        store.initialize()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        self.backend.root()
    }
}
