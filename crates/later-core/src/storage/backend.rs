//! Storage backends
//!
//! A backend holds the raw document keys. It does not fill in defaults or
//! validate anything; the `Store` does that on top.

use tracing::debug;

use crate::models::{DocumentPatch, StorageSchema};
use crate::storage::error::StorageResult;

/// Where the document lives
///
/// `load` returns only the keys the backend actually holds. `commit` writes
/// every key present in the patch and leaves the others alone; all keys of
/// one commit land together.
pub trait StorageBackend: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Read every stored key
    fn load(&mut self) -> StorageResult<DocumentPatch>;

    /// Overwrite the keys present in `patch`
    fn commit(&mut self, patch: &DocumentPatch) -> StorageResult<()>;
}

/// Volatile backend kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    stored: DocumentPatch,
}

impl MemoryBackend {
    /// A backend holding no keys at all
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend pre-filled with a full document
    pub fn with_document(doc: StorageSchema) -> Self {
        Self { stored: doc.into() }
    }
}

impl StorageBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&mut self) -> StorageResult<DocumentPatch> {
        Ok(self.stored.clone())
    }

    fn commit(&mut self, patch: &DocumentPatch) -> StorageResult<()> {
        debug!("memory commit of {:?}", patch.keys());
        self.stored.merge(patch);
        Ok(())
    }
}
