use crate::error::Result;
use std::path::PathBuf;
use std::time::SystemTime;

/// The three JSON documents of the file store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Activities,
    Weights,
    Settings,
}

impl Document {
    pub const ALL: [Document; 3] = [Document::Activities, Document::Weights, Document::Settings];

    pub fn file_name(&self) -> &'static str {
        match self {
            Document::Activities => "activities.json",
            Document::Weights => "weight.json",
            Document::Settings => "settings.json",
        }
    }

    /// Content written when the document does not exist yet.
    pub fn default_content(&self) -> &'static str {
        match self {
            Document::Activities | Document::Weights => "[]",
            Document::Settings => "{\n  \"weight_goal\": null\n}",
        }
    }
}

/// Abstract interface for raw document I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while JsonStore handles the "what" (validation, ids, ordering, caching).
pub trait StorageBackend {
    /// Read a document's raw text.
    /// Returns Ok(None) if the document does not exist.
    /// Returns Err only on actual I/O errors (permissions, disk failure).
    fn read_document(&self, doc: Document) -> Result<Option<String>>;

    /// Replace a document's content.
    /// MUST be atomic (e.g. write to tmp then rename): a reader sees either the
    /// old or the new content, never a partial write.
    fn write_document(&self, doc: Document, content: &str) -> Result<()>;

    /// Last-modified time, or None if the document does not exist.
    fn modified(&self, doc: Document) -> Result<Option<SystemTime>>;

    /// Where the document lives. For MemBackend, a virtual path.
    fn document_path(&self, doc: Document) -> PathBuf;

    /// Create any missing document with its default content.
    fn ensure_documents(&self) -> Result<()> {
        for doc in Document::ALL {
            if self.modified(doc)?.is_none() {
                self.write_document(doc, doc.default_content())?;
            }
        }
        Ok(())
    }
}
