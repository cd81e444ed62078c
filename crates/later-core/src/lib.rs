//! Later Core Library
//!
//! This crate provides the storage layer behind Later, a read-it-later
//! bookmark keeper: bookmarks sorted into groups, tagged, and marked read
//! or unread.
//!
//! # Architecture
//!
//! - **Document**: everything lives in one persisted document with the keys
//!   `bookmarks`, `groups`, `settings`, `backups` and `searchHistory`
//! - **Backends**: SQLite (live) or a JSON mirror file (development),
//!   chosen once when the store opens
//!
//! Entity operations read the document, change it in memory and commit
//! only the keys they touched. Search, sort and projections are pure
//! functions over a snapshot.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Save a link
//! let bookmark = store.add_bookmark(NewBookmark::new("Example", "https://example.com"))?;
//!
//! // Query the snapshot
//! let doc = store.get()?;
//! let hits = search_bookmarks(&doc.bookmarks, "exmpl");
//! ```
//!
//! # Modules
//!
//! - `store`: Document store and entity operations (main entry point)
//! - `models`: Bookmarks, groups, settings and the document shape
//! - `storage`: Backends, write validation and storage errors
//! - `import_export`: JSON/CSV export and two-phase import
//! - `search`: Fuzzy search, highlighting and search history
//! - `sort`: Sorting and read-status filtering
//! - `projection`: Tag, group and read-count views of a snapshot
//! - `config`: Application configuration

pub mod config;
pub mod import_export;
pub mod models;
pub mod projection;
pub mod search;
pub mod sort;
pub mod storage;
pub mod store;

pub use config::{BackendKind, Config};
pub use import_export::{ExportFormat, ImportError, ImportMode, ImportReport, ImportSummary};
pub use models::{
    Backup, Bookmark, BookmarkUpdate, DocumentPatch, Group, GroupUpdate, NewBookmark,
    SearchHistory, Settings, StorageSchema, Theme, DEFAULT_GROUP_ID,
};
pub use search::{fuzzy_match, highlight_match, search_bookmarks};
pub use sort::{sort_bookmarks, ReadStatusFilter, SortOptions, SortOrder, SortType};
pub use storage::{StorageError, StorageResult};
pub use store::Store;
