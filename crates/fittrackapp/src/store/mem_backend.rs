use super::backend::{Document, StorageBackend};
use crate::error::{FitError, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Clone)]
struct DocEntry {
    text: String,
    mtime: SystemTime,
}

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the store is single-threaded.
/// Modification times come from a logical clock that ticks on every write, so
/// cache staleness tests do not depend on filesystem timestamp resolution.
pub struct MemBackend {
    docs: RefCell<HashMap<Document, DocEntry>>,
    clock: Cell<u64>,
    simulate_write_error: Cell<bool>,
    simulate_stat_error: Cell<bool>,
    reads: Cell<u64>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self {
            docs: RefCell::new(HashMap::new()),
            clock: Cell::new(0),
            simulate_write_error: Cell::new(false),
            simulate_stat_error: Cell::new(false),
            reads: Cell::new(0),
        }
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Make `modified` fail, as a failing `stat` would.
    pub fn set_simulate_stat_error(&self, simulate: bool) {
        self.simulate_stat_error.set(simulate);
    }

    /// Test helper to replace a document behind the store's back,
    /// as another process editing the file would.
    pub fn put_raw(&self, doc: Document, text: &str) {
        let mtime = self.tick();
        self.docs.borrow_mut().insert(
            doc,
            DocEntry {
                text: text.to_string(),
                mtime,
            },
        );
    }

    pub fn raw(&self, doc: Document) -> Option<String> {
        self.docs.borrow().get(&doc).map(|e| e.text.clone())
    }

    /// Number of `read_document` calls served, for cache tests.
    pub fn read_count(&self) -> u64 {
        self.reads.get()
    }

    fn tick(&self) -> SystemTime {
        let next = self.clock.get() + 1;
        self.clock.set(next);
        UNIX_EPOCH + Duration::from_secs(next)
    }
}

impl StorageBackend for MemBackend {
    fn read_document(&self, doc: Document) -> Result<Option<String>> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.raw(doc))
    }

    fn write_document(&self, doc: Document, content: &str) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(FitError::Store("Simulated write error".to_string()));
        }
        self.put_raw(doc, content);
        Ok(())
    }

    fn modified(&self, doc: Document) -> Result<Option<SystemTime>> {
        if self.simulate_stat_error.get() {
            return Err(FitError::Store("Simulated stat error".to_string()));
        }
        Ok(self.docs.borrow().get(&doc).map(|e| e.mtime))
    }

    fn document_path(&self, doc: Document) -> PathBuf {
        PathBuf::from(format!("memory://{}", doc.file_name()))
    }
}
