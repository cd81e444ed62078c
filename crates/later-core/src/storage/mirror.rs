//! Development mirror backend
//!
//! Keeps the full document in memory and mirrors it to a single JSON blob
//! file so data survives restarts. The mirror is rehydrated from the file
//! before every read; every commit merges into the mirror and rewrites the
//! whole blob.
//!
//! Uses atomic writes (write to temp file, then rename) to prevent
//! corruption.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::models::{DocumentPatch, StorageSchema};
use crate::storage::backend::StorageBackend;
use crate::storage::error::{StorageError, StorageResult};

/// File name of the mirrored blob inside the data directory
pub const MIRROR_FILE_NAME: &str = "web-later-mock.json";

/// In-memory document mirrored to a JSON file
pub struct FileMirrorBackend {
    path: PathBuf,
    mirror: StorageSchema,
}

impl FileMirrorBackend {
    /// Open the mirror at `path`, loading the blob if it already exists
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let mut backend = Self {
            path: path.into(),
            mirror: StorageSchema::default(),
        };
        backend.rehydrate()?;
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the in-memory mirror with the blob on disk, if any
    fn rehydrate(&mut self) -> StorageResult<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StorageError::ReadError {
            path: self.path.clone(),
            source,
        })?;

        self.mirror =
            serde_json::from_str(&content).map_err(|e| StorageError::CorruptDocument {
                path: self.path.clone(),
                details: e.to_string(),
            })?;
        Ok(())
    }
}

impl StorageBackend for FileMirrorBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn load(&mut self) -> StorageResult<DocumentPatch> {
        debug!("Reading from mirror {:?}", self.path);
        self.rehydrate()?;
        Ok(self.mirror.clone().into())
    }

    fn commit(&mut self, patch: &DocumentPatch) -> StorageResult<()> {
        debug!("Writing {:?} to mirror {:?}", patch.keys(), self.path);
        self.mirror.apply(patch.clone());
        let blob = serde_json::to_vec(&self.mirror)?;
        atomic_write(&self.path, &blob)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
