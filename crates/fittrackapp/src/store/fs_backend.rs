use super::backend::{Document, StorageBackend};
use crate::error::{FitError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(FitError::Io)?;
        }
        Ok(())
    }

    fn write_tmp(tmp_path: &Path, content: &str) -> std::io::Result<()> {
        let mut file = fs::File::create(tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    }
}

impl StorageBackend for FsBackend {
    fn read_document(&self, doc: Document) -> Result<Option<String>> {
        let path = self.document_path(doc);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(FitError::Io)?;
        Ok(Some(content))
    }

    fn write_document(&self, doc: Document, content: &str) -> Result<()> {
        self.ensure_dir()?;
        let target = self.document_path(doc);

        // Atomic write: the temp file lives next to the target so the rename
        // never crosses a filesystem boundary.
        let stem = doc.file_name().trim_end_matches(".json");
        let tmp_path = self.root.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));

        let written = Self::write_tmp(&tmp_path, content).and_then(|_| fs::rename(&tmp_path, &target));
        if let Err(e) = written {
            if tmp_path.exists() {
                if let Err(cleanup) = fs::remove_file(&tmp_path) {
                    warn!(path = %tmp_path.display(), error = %cleanup, "failed to remove temp file");
                }
            }
            return Err(FitError::Io(e));
        }

        debug!(path = %target.display(), bytes = content.len(), "document written");
        Ok(())
    }

    fn modified(&self, doc: Document) -> Result<Option<SystemTime>> {
        let path = self.document_path(doc);
        if !path.exists() {
            return Ok(None);
        }
        let meta = fs::metadata(path).map_err(FitError::Io)?;
        Ok(Some(meta.modified().unwrap_or_else(|_| SystemTime::now())))
    }

    fn document_path(&self, doc: Document) -> PathBuf {
        self.root.join(doc.file_name())
    }
}
