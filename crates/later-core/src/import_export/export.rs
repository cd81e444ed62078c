//! Document export
//!
//! JSON exports wrap the whole document in a versioned envelope; CSV
//! exports carry one row per bookmark.

use serde::{Deserialize, Serialize};

use super::csv::quote;
use crate::models::StorageSchema;

/// Version written into every JSON export envelope
pub const EXPORT_VERSION: &str = "1.0";

/// CSV header row
pub const CSV_HEADERS: [&str; 8] = [
    "Title",
    "URL",
    "Group",
    "Tags",
    "Created At",
    "Updated At",
    "Is Read",
    "Notes",
];

/// Envelope around an exported document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: String,
    /// Export time (epoch ms)
    pub exported_at: i64,
    pub data: StorageSchema,
}

impl ExportEnvelope {
    pub fn new(data: StorageSchema, exported_at: i64) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at,
            data,
        }
    }
}

/// Serialize the document as a pretty-printed JSON envelope
pub fn export_json(doc: &StorageSchema, exported_at: i64) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ExportEnvelope::new(doc.clone(), exported_at))
}

/// Serialize the bookmarks as CSV
///
/// The Group column holds the raw group id. Text fields are quoted;
/// timestamps and the read flag are not.
pub fn export_csv(doc: &StorageSchema) -> String {
    let mut lines = Vec::with_capacity(doc.bookmarks.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for bookmark in &doc.bookmarks {
        let row = [
            quote(&bookmark.title),
            quote(&bookmark.url),
            quote(&bookmark.group_id),
            quote(&bookmark.tags.join(", ")),
            bookmark.created_at.to_string(),
            bookmark
                .updated_at
                .map(|t| t.to_string())
                .unwrap_or_default(),
            if bookmark.is_read { "Yes" } else { "No" }.to_string(),
            quote(bookmark.notes.as_deref().unwrap_or("")),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}
