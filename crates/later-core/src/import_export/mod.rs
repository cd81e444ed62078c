//! Import and export of the whole document
//!
//! Exports are plain strings handed to an [`ExportSink`]. Imports are two
//! phase: parsing produces a `StorageSchema` in memory, and the caller then
//! applies it with [`ImportMode::Merge`] or [`ImportMode::Replace`].

pub mod csv;
pub mod export;
pub mod import;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::StorageSchema;
use crate::storage::mirror::atomic_write;
use crate::storage::StorageResult;

pub use export::{export_csv, export_json, ExportEnvelope, CSV_HEADERS, EXPORT_VERSION};
pub use import::{combine, import_csv, import_json, validate_payload};

/// Message reported by a successful import
pub const IMPORT_SUCCESS_MESSAGE: &str = "Import successful";

/// Prefix of every export file name
const EXPORT_FILE_PREFIX: &str = "web-later-export";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown format '{}', expected json or csv", other)),
        }
    }
}

/// `web-later-export-YYYY-MM-DD.<ext>`
pub fn export_filename(format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "{}-{}.{}",
        EXPORT_FILE_PREFIX,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Destination for exported files
pub trait ExportSink {
    /// Store `content` under `filename` and report where it went
    fn save(&mut self, content: &str, filename: &str, mime_type: &str) -> StorageResult<PathBuf>;
}

/// Writes exports into a directory on disk
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for DirectorySink {
    fn save(&mut self, content: &str, filename: &str, mime_type: &str) -> StorageResult<PathBuf> {
        let path = self.dir.join(filename);
        debug!("Writing {} export to {:?}", mime_type, path);
        atomic_write(&path, content.as_bytes())?;
        Ok(path)
    }
}

/// How an imported document is combined with the current one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Keep current entities, add incoming ones with new ids
    #[default]
    Merge,
    /// Discard current bookmarks and groups
    Replace,
}

/// What an applied import changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub bookmarks_added: usize,
    /// Incoming bookmarks whose id already existed
    pub bookmarks_skipped: usize,
    pub groups_added: usize,
    pub groups_skipped: usize,
    /// Bookmarks moved to the default group because their group was missing
    pub reassigned: usize,
}

/// Import failures
///
/// The messages are fixed; details of the underlying parse error are
/// dropped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportError {
    #[error("Invalid data format")]
    InvalidFormat,

    #[error("Failed to parse file")]
    ParseFailed,

    #[error("CSV file is empty or malformed")]
    EmptyCsv,
}

/// Result of an import in reportable form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StorageSchema>,
}

impl From<Result<StorageSchema, ImportError>> for ImportReport {
    fn from(result: Result<StorageSchema, ImportError>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                message: IMPORT_SUCCESS_MESSAGE.to_string(),
                data: Some(data),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
                data: None,
            },
        }
    }
}
