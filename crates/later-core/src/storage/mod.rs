//! Storage layer
//!
//! The whole document lives in one flat key namespace (`bookmarks`,
//! `groups`, `settings`, `backups`, `searchHistory`).
//!
//! ## Backends
//!
//! - **SQLite**: the live store, one row per key
//! - **File mirror**: development fallback, the whole document as a JSON blob
//! - **Memory**: volatile, for tests
//!
//! The backend is chosen once when the `Store` is opened.

pub mod backend;
pub mod error;
pub mod mirror;
pub mod schema;
pub mod sqlite;
pub mod validation;

pub use backend::{MemoryBackend, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use mirror::{FileMirrorBackend, MIRROR_FILE_NAME};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use sqlite::SqliteBackend;
pub use validation::{validate_patch, Validation};
