//! Document store
//!
//! The `Store` owns one storage backend and implements every entity
//! operation as a read-modify-write over the persisted document:
//! read the document, change it in memory, commit only the keys that
//! changed.
//!
//! All mutating methods take `&mut self`, so within one process writes are
//! serialized and a read-modify-write can never interleave with another.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open()?;
//!
//! let bookmark = store.add_bookmark(NewBookmark::new("Rust", "https://rust-lang.org"))?;
//! store.add_tag(&bookmark.id, "lang")?;
//!
//! let doc = store.get()?;
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{BackendKind, Config};
use crate::import_export::{
    combine, export_csv, export_filename, export_json, import_csv, import_json, ExportFormat,
    ExportSink, ImportMode, ImportReport, ImportSummary,
};
use crate::models::{
    generate_id, now_millis, Backup, Bookmark, BookmarkUpdate, DocumentPatch, Group, GroupUpdate,
    NewBookmark, SearchHistory, Settings, StorageSchema, Theme, DEFAULT_GROUP_ID,
};
use crate::projection::UNKNOWN_GROUP_NAME;
use crate::search::push_search_history;
use crate::storage::{
    validate_patch, FileMirrorBackend, MemoryBackend, SqliteBackend, StorageBackend, StorageError,
    StorageResult, Validation,
};

/// Persisted bookmark document and the operations on it
pub struct Store {
    backend: Box<dyn StorageBackend>,
}

impl Store {
    /// Open the store described by the user's configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(&config).context("Failed to open storage")
    }

    /// Open the backend selected in `config`
    pub fn open_with_config(config: &Config) -> StorageResult<Self> {
        let backend: Box<dyn StorageBackend> = match config.backend {
            BackendKind::Sqlite => Box::new(SqliteBackend::open(&config.sqlite_path())?),
            BackendKind::File => Box::new(FileMirrorBackend::open(config.mirror_path())?),
        };
        debug!("Store opened on {} backend", backend.name());
        Ok(Self { backend })
    }

    /// Wrap an already constructed backend
    pub fn with_backend(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// A store holding nothing, backed by memory
    pub fn in_memory() -> Self {
        Self::with_backend(MemoryBackend::new())
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    // ==================== Document ====================

    /// Read the whole document
    ///
    /// A missing `bookmarks` key reads as empty and a missing `groups` key
    /// as the single default group.
    pub fn get(&mut self) -> StorageResult<StorageSchema> {
        let stored = self.backend.load()?;
        debug!("Loaded {:?} from {}", stored.keys(), self.backend.name());
        Ok(StorageSchema::from_stored(stored))
    }

    /// Overwrite the keys present in `patch`, leaving the others alone
    pub fn set(&mut self, patch: DocumentPatch) -> StorageResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        debug!("Committing {:?} to {}", patch.keys(), self.backend.name());
        self.backend.commit(&patch)
    }

    /// Validate a raw payload and write it
    ///
    /// Any unknown key or malformed value rejects the whole payload and
    /// nothing is written.
    pub fn set_json(&mut self, payload: &Value) -> StorageResult<()> {
        match validate_patch(payload) {
            Validation::Valid(patch) => self.set(patch),
            Validation::Invalid(errors) => {
                warn!("Rejected write: {:?}", errors);
                Err(StorageError::Validation { errors })
            }
        }
    }

    // ==================== Bookmarks ====================

    /// Save a new bookmark at the front of the list
    ///
    /// Title and url must not be blank. A missing or unknown group lands the
    /// bookmark in the default group.
    pub fn add_bookmark(&mut self, new: NewBookmark) -> StorageResult<Bookmark> {
        require_text(&[("title", Some(&new.title)), ("url", Some(&new.url))])?;

        let mut doc = self.get()?;
        let group_id = new
            .group_id
            .filter(|id| doc.has_group(id))
            .unwrap_or_else(|| DEFAULT_GROUP_ID.to_string());

        let now = now_millis();
        let bookmark = Bookmark {
            id: generate_id(),
            title: new.title,
            url: new.url,
            group_id,
            created_at: now,
            updated_at: Some(now),
            order: Some(new.order.unwrap_or(0)),
            tags: new.tags,
            is_read: new.is_read,
            notes: Some(new.notes.unwrap_or_default()),
        };

        doc.bookmarks.insert(0, bookmark.clone());
        self.set(DocumentPatch::default().with_bookmarks(doc.bookmarks))?;
        Ok(bookmark)
    }

    /// Shallow-merge `update` into a bookmark
    ///
    /// Returns false when no bookmark has this id. `updated_at` changes only
    /// when the update carries it; a group id that does not exist is
    /// replaced by the default group. A blank title or url is rejected.
    pub fn update_bookmark(&mut self, id: &str, mut update: BookmarkUpdate) -> StorageResult<bool> {
        require_text(&[
            ("title", update.title.as_ref()),
            ("url", update.url.as_ref()),
        ])?;

        let mut doc = self.get()?;

        if update
            .group_id
            .as_deref()
            .is_some_and(|group_id| !doc.has_group(group_id))
        {
            update.group_id = Some(DEFAULT_GROUP_ID.to_string());
        }

        let Some(bookmark) = doc.bookmarks.iter_mut().find(|b| b.id == id) else {
            return Ok(false);
        };
        bookmark.apply(update);

        self.set(DocumentPatch::default().with_bookmarks(doc.bookmarks))?;
        Ok(true)
    }

    /// Delete a bookmark; false when it did not exist
    pub fn remove_bookmark(&mut self, id: &str) -> StorageResult<bool> {
        let mut doc = self.get()?;
        let before = doc.bookmarks.len();
        doc.bookmarks.retain(|b| b.id != id);
        if doc.bookmarks.len() == before {
            return Ok(false);
        }

        self.set(DocumentPatch::default().with_bookmarks(doc.bookmarks))?;
        Ok(true)
    }

    pub fn get_bookmark(&mut self, id: &str) -> StorageResult<Option<Bookmark>> {
        Ok(self.get()?.bookmark(id).cloned())
    }

    /// Set the read flag on many bookmarks in one commit
    ///
    /// Returns how many bookmarks actually changed. Unknown ids are ignored.
    pub fn set_read_many(&mut self, ids: &[String], is_read: bool) -> StorageResult<usize> {
        let mut doc = self.get()?;
        let mut changed = 0;
        for bookmark in doc.bookmarks.iter_mut() {
            if bookmark.is_read != is_read && ids.contains(&bookmark.id) {
                bookmark.is_read = is_read;
                changed += 1;
            }
        }

        if changed > 0 {
            self.set(DocumentPatch::default().with_bookmarks(doc.bookmarks))?;
        }
        Ok(changed)
    }

    // ==================== Tags ====================

    /// Add a tag to a bookmark
    ///
    /// Returns false when the bookmark is unknown or already has the tag.
    pub fn add_tag(&mut self, id: &str, tag: &str) -> StorageResult<bool> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(StorageError::invalid("tag must not be empty"));
        }

        self.modify_bookmark(id, |bookmark| {
            if bookmark.has_tag(tag) {
                return false;
            }
            bookmark.tags.push(tag.to_string());
            true
        })
    }

    /// Remove a tag from a bookmark; false when nothing was removed
    pub fn remove_tag(&mut self, id: &str, tag: &str) -> StorageResult<bool> {
        let tag = tag.trim();
        self.modify_bookmark(id, |bookmark| {
            let before = bookmark.tags.len();
            bookmark.tags.retain(|t| t != tag);
            bookmark.tags.len() != before
        })
    }

    /// Replace a bookmark's tags
    ///
    /// Tags are trimmed; blanks and repeats are dropped, first occurrence
    /// wins.
    pub fn set_tags(&mut self, id: &str, tags: &[String]) -> StorageResult<bool> {
        let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !cleaned.iter().any(|t| t == tag) {
                cleaned.push(tag.to_string());
            }
        }

        self.modify_bookmark(id, |bookmark| {
            if bookmark.tags == cleaned {
                return false;
            }
            bookmark.tags = cleaned;
            true
        })
    }

    /// Apply `change` to one bookmark and commit if it reports a change
    fn modify_bookmark<F>(&mut self, id: &str, change: F) -> StorageResult<bool>
    where
        F: FnOnce(&mut Bookmark) -> bool,
    {
        let mut doc = self.get()?;
        let changed = match doc.bookmarks.iter_mut().find(|b| b.id == id) {
            Some(bookmark) => change(bookmark),
            None => false,
        };

        if changed {
            self.set(DocumentPatch::default().with_bookmarks(doc.bookmarks))?;
        }
        Ok(changed)
    }

    // ==================== Groups ====================

    /// Create a group at the end of the list
    ///
    /// Its order is the number of groups that existed before it.
    pub fn add_group(&mut self, name: &str) -> StorageResult<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StorageError::invalid("group name must not be empty"));
        }

        let mut doc = self.get()?;
        let group = Group::new(generate_id(), name, doc.groups.len() as i64);
        doc.groups.push(group.clone());

        self.set(DocumentPatch::default().with_groups(doc.groups))?;
        Ok(group)
    }

    /// Update a group; the default group is never changed
    ///
    /// A blank name is rejected.
    pub fn update_group(&mut self, id: &str, update: GroupUpdate) -> StorageResult<bool> {
        require_text(&[("group name", update.name.as_ref())])?;
        if id == DEFAULT_GROUP_ID {
            return Ok(false);
        }

        let mut doc = self.get()?;
        let Some(group) = doc.groups.iter_mut().find(|g| g.id == id) else {
            return Ok(false);
        };
        group.apply(update);

        self.set(DocumentPatch::default().with_groups(doc.groups))?;
        Ok(true)
    }

    /// Delete a group and move its bookmarks to the default group
    ///
    /// Groups and bookmarks are committed together. The default group is
    /// never deleted.
    pub fn delete_group(&mut self, id: &str) -> StorageResult<bool> {
        if id == DEFAULT_GROUP_ID {
            return Ok(false);
        }

        let mut doc = self.get()?;
        let before = doc.groups.len();
        doc.groups.retain(|g| g.id != id);
        if doc.groups.len() == before {
            return Ok(false);
        }

        let mut moved = 0;
        for bookmark in doc.bookmarks.iter_mut().filter(|b| b.group_id == id) {
            bookmark.group_id = DEFAULT_GROUP_ID.to_string();
            moved += 1;
        }

        self.set(
            DocumentPatch::default()
                .with_groups(doc.groups)
                .with_bookmarks(doc.bookmarks),
        )?;
        info!("Deleted group {}, moved {} bookmark(s) to default", id, moved);
        Ok(true)
    }

    pub fn get_groups(&mut self) -> StorageResult<Vec<Group>> {
        Ok(self.get()?.groups)
    }

    /// Display name of a group, `"Unknown"` for an id that does not exist
    pub fn group_name(&mut self, id: &str) -> StorageResult<String> {
        Ok(self
            .get()?
            .groups
            .into_iter()
            .find(|g| g.id == id)
            .map(|g| g.name)
            .unwrap_or_else(|| UNKNOWN_GROUP_NAME.to_string()))
    }

    // ==================== Settings ====================

    pub fn settings(&mut self) -> StorageResult<Option<Settings>> {
        Ok(self.get()?.settings)
    }

    /// Stored theme, or the system preference when nothing is stored
    pub fn theme(&mut self, system_prefers_dark: bool) -> StorageResult<Theme> {
        Ok(self
            .settings()?
            .map(|s| s.theme)
            .unwrap_or_else(|| Theme::from_preference(system_prefers_dark)))
    }

    /// Store a theme, creating default settings first if there are none
    pub fn set_theme(&mut self, theme: Theme) -> StorageResult<()> {
        let mut settings = self.settings()?.unwrap_or_default();
        settings.theme = theme;
        self.set(DocumentPatch::default().with_settings(settings))
    }

    /// Switch between light and dark and return the new theme
    pub fn toggle_theme(&mut self, system_prefers_dark: bool) -> StorageResult<Theme> {
        let theme = self.theme(system_prefers_dark)?.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    // ==================== Search history ====================

    /// Remembered queries, most recent first
    pub fn search_history(&mut self) -> StorageResult<Vec<SearchHistory>> {
        Ok(self.get()?.search_history.unwrap_or_default())
    }

    /// Remember a query; blank queries are ignored
    pub fn save_search(&mut self, query: &str) -> StorageResult<bool> {
        let mut history = self.search_history()?;
        if !push_search_history(&mut history, query, now_millis()) {
            return Ok(false);
        }

        self.set(DocumentPatch::default().with_search_history(history))?;
        Ok(true)
    }

    pub fn clear_search_history(&mut self) -> StorageResult<()> {
        self.set(DocumentPatch::default().with_search_history(Vec::new()))
    }

    // ==================== Backups ====================

    /// Snapshot bookmarks and groups into the backup list
    ///
    /// The newest backup comes first.
    pub fn create_backup(&mut self) -> StorageResult<Backup> {
        let doc = self.get()?;
        let snapshot = StorageSchema {
            bookmarks: doc.bookmarks,
            groups: doc.groups,
            settings: None,
            backups: None,
            search_history: None,
        };
        let size = serde_json::to_vec(&snapshot)?.len() as u64;

        let backup = Backup {
            id: generate_id(),
            timestamp: now_millis(),
            data: snapshot,
            size,
        };

        let mut backups = doc.backups.unwrap_or_default();
        backups.insert(0, backup.clone());
        self.set(DocumentPatch::default().with_backups(backups))?;

        info!(
            "Created backup {} ({} bookmark(s), {} bytes)",
            backup.id,
            backup.data.bookmarks.len(),
            size
        );
        Ok(backup)
    }

    pub fn backups(&mut self) -> StorageResult<Vec<Backup>> {
        Ok(self.get()?.backups.unwrap_or_default())
    }

    /// Replace bookmarks and groups with a backup's snapshot
    ///
    /// Returns false when no backup has this id.
    pub fn restore_backup(&mut self, id: &str) -> StorageResult<bool> {
        let Some(backup) = self.backups()?.into_iter().find(|b| b.id == id) else {
            return Ok(false);
        };

        let mut data = backup.data;
        data.repair();
        self.set(
            DocumentPatch::default()
                .with_bookmarks(data.bookmarks)
                .with_groups(data.groups),
        )?;
        info!("Restored backup {}", id);
        Ok(true)
    }

    pub fn delete_backup(&mut self, id: &str) -> StorageResult<bool> {
        let mut backups = self.backups()?;
        let before = backups.len();
        backups.retain(|b| b.id != id);
        if backups.len() == before {
            return Ok(false);
        }

        self.set(DocumentPatch::default().with_backups(backups))?;
        Ok(true)
    }

    // ==================== Import / export ====================

    /// Parse import content without writing anything
    ///
    /// CSV group names are resolved against the current groups.
    pub fn prepare_import(&mut self, content: &str, format: ExportFormat) -> StorageResult<ImportReport> {
        let parsed = match format {
            ExportFormat::Json => import_json(content),
            ExportFormat::Csv => import_csv(content, &self.get_groups()?),
        };
        Ok(parsed.into())
    }

    /// Combine imported data with the document and commit it
    ///
    /// Only `bookmarks` and `groups` are written; settings, backups and
    /// search history stay as they are.
    pub fn apply_import(&mut self, data: StorageSchema, mode: ImportMode) -> StorageResult<ImportSummary> {
        let current = self.get()?;
        let (combined, summary) = combine(&current, data, mode);

        self.set(
            DocumentPatch::default()
                .with_bookmarks(combined.bookmarks)
                .with_groups(combined.groups),
        )?;

        info!("Applied {:?} import: {:?}", mode, summary);
        Ok(summary)
    }

    /// The whole document as a JSON export envelope
    pub fn export_json(&mut self) -> StorageResult<String> {
        let doc = self.get()?;
        Ok(export_json(&doc, now_millis())?)
    }

    /// The bookmarks as CSV
    pub fn export_csv(&mut self) -> StorageResult<String> {
        Ok(export_csv(&self.get()?))
    }

    /// Export in `format` and hand the result to `sink` under today's file name
    pub fn export_to(&mut self, sink: &mut dyn ExportSink, format: ExportFormat) -> StorageResult<PathBuf> {
        let content = match format {
            ExportFormat::Json => self.export_json()?,
            ExportFormat::Csv => self.export_csv()?,
        };
        let filename = export_filename(format, Local::now().date_naive());
        sink.save(&content, &filename, format.mime_type())
    }
}

/// Reject present-but-blank text fields, reporting every one of them
fn require_text(fields: &[(&str, Option<&String>)]) -> StorageResult<()> {
    let errors: Vec<String> = fields
        .iter()
        .filter(|(_, value)| value.is_some_and(|v| v.trim().is_empty()))
        .map(|(name, _)| format!("{} must not be empty", name))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(StorageError::Validation { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import_export::DirectorySink;
    use crate::search::MAX_SEARCH_HISTORY;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir, backend: BackendKind) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            backend,
            export_dir: None,
            log_file: None,
        }
    }

    fn add(store: &mut Store, title: &str) -> Bookmark {
        store
            .add_bookmark(NewBookmark::new(title, format!("https://{}.example", title)))
            .unwrap()
    }

    fn titles(store: &mut Store) -> Vec<String> {
        store
            .get()
            .unwrap()
            .bookmarks
            .into_iter()
            .map(|b| b.title)
            .collect()
    }

    #[test]
    fn test_empty_store_has_default_group() {
        let mut store = Store::in_memory();
        let doc = store.get().unwrap();

        assert!(doc.bookmarks.is_empty());
        assert_eq!(doc.groups, vec![Group::default_group()]);
        assert!(doc.settings.is_none());
    }

    #[test]
    fn test_set_merges_key_by_key() {
        let mut store = Store::in_memory();
        add(&mut store, "kept");

        let groups = vec![Group::default_group(), Group::new("g1", "Work", 1)];
        store
            .set(DocumentPatch::default().with_groups(groups.clone()))
            .unwrap();

        let doc = store.get().unwrap();
        assert_eq!(doc.groups, groups);
        assert_eq!(doc.bookmarks.len(), 1);
        assert_eq!(doc.bookmarks[0].title, "kept");
    }

    #[test]
    fn test_set_json_rejects_unknown_key_without_writing() {
        let mut store = Store::in_memory();
        add(&mut store, "before");
        let before = store.get().unwrap();

        let err = store
            .set_json(&json!({ "bookmarks": [], "favorites": [] }))
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(err.validation_errors(), ["Invalid key: favorites"]);
        assert_eq!(store.get().unwrap(), before);
    }

    #[test]
    fn test_set_json_rejects_wrong_shapes() {
        let mut store = Store::in_memory();

        let err = store
            .set_json(&json!({ "groups": {}, "settings": [] }))
            .unwrap_err();

        assert_eq!(err.validation_errors().len(), 2);
        assert_eq!(store.get().unwrap(), StorageSchema::default());
    }

    #[test]
    fn test_set_json_valid_write() {
        let mut store = Store::in_memory();
        store
            .set_json(&json!({ "searchHistory": [{ "query": "rust", "timestamp": 1 }] }))
            .unwrap();

        assert_eq!(store.search_history().unwrap()[0].query, "rust");
    }

    #[test]
    fn test_add_bookmark_prepends() {
        let mut store = Store::in_memory();
        add(&mut store, "first");
        add(&mut store, "second");

        assert_eq!(titles(&mut store), vec!["second", "first"]);
    }

    #[test]
    fn test_add_bookmark_defaults() {
        let mut store = Store::in_memory();
        let bookmark = add(&mut store, "new");

        assert_eq!(bookmark.group_id, DEFAULT_GROUP_ID);
        assert_eq!(bookmark.updated_at, Some(bookmark.created_at));
        assert_eq!(bookmark.order, Some(0));
        assert_eq!(bookmark.notes.as_deref(), Some(""));
        assert!(bookmark.tags.is_empty());
        assert!(!bookmark.is_read);
        assert_eq!(store.get_bookmark(&bookmark.id).unwrap(), Some(bookmark));
    }

    #[test]
    fn test_add_bookmark_unknown_group_falls_back_to_default() {
        let mut store = Store::in_memory();
        let group = store.add_group("Work").unwrap();

        let in_work = store
            .add_bookmark(NewBookmark::new("a", "https://a").in_group(&group.id))
            .unwrap();
        let in_missing = store
            .add_bookmark(NewBookmark::new("b", "https://b").in_group("nope"))
            .unwrap();

        assert_eq!(in_work.group_id, group.id);
        assert_eq!(in_missing.group_id, DEFAULT_GROUP_ID);
    }

    #[test]
    fn test_add_bookmark_rejects_blank_fields() {
        let mut store = Store::in_memory();
        let err = store.add_bookmark(NewBookmark::new(" ", "")).unwrap_err();

        assert_eq!(err.validation_errors().len(), 2);
        assert!(store.get().unwrap().bookmarks.is_empty());
    }

    #[test]
    fn test_update_bookmark_rejects_blank_fields() {
        let mut store = Store::in_memory();
        let saved = add(&mut store, "keep");

        let update = BookmarkUpdate {
            title: Some(String::new()),
            url: Some("  ".to_string()),
            ..Default::default()
        };
        let err = store.update_bookmark(&saved.id, update).unwrap_err();
        assert_eq!(err.validation_errors().len(), 2);
        assert_eq!(store.get_bookmark(&saved.id).unwrap().unwrap().title, "keep");

        let exported = store.export_json().unwrap();
        let report = store.prepare_import(&exported, ExportFormat::Json).unwrap();
        assert!(report.success);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = Store::in_memory();
        let a = add(&mut store, "a");
        let b = add(&mut store, "b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_update_bookmark_does_not_stamp() {
        let mut store = Store::in_memory();
        let bookmark = add(&mut store, "old");

        let update = BookmarkUpdate {
            title: Some("new".to_string()),
            ..Default::default()
        };
        assert!(store.update_bookmark(&bookmark.id, update).unwrap());

        let updated = store.get_bookmark(&bookmark.id).unwrap().unwrap();
        assert_eq!(updated.title, "new");
        assert_eq!(updated.url, bookmark.url);
        assert_eq!(updated.updated_at, bookmark.updated_at);
        assert_eq!(updated.created_at, bookmark.created_at);
    }

    #[test]
    fn test_update_bookmark_touched_stamps() {
        let mut store = Store::in_memory();
        let bookmark = add(&mut store, "old");
        // Make the stamp observable regardless of clock resolution
        store
            .update_bookmark(
                &bookmark.id,
                BookmarkUpdate {
                    updated_at: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();

        store
            .update_bookmark(&bookmark.id, BookmarkUpdate::default().touched())
            .unwrap();

        let updated = store.get_bookmark(&bookmark.id).unwrap().unwrap();
        assert!(updated.updated_at.unwrap() > 0);
    }

    #[test]
    fn test_update_unknown_bookmark_is_noop() {
        let mut store = Store::in_memory();
        add(&mut store, "only");
        let before = store.get().unwrap();

        let update = BookmarkUpdate {
            is_read: Some(true),
            ..Default::default()
        };
        assert!(!store.update_bookmark("missing", update).unwrap());
        assert_eq!(store.get().unwrap(), before);
    }

    #[test]
    fn test_update_bookmark_to_missing_group() {
        let mut store = Store::in_memory();
        let group = store.add_group("Work").unwrap();
        let bookmark = store
            .add_bookmark(NewBookmark::new("a", "https://a").in_group(&group.id))
            .unwrap();

        let update = BookmarkUpdate {
            group_id: Some("gone".to_string()),
            ..Default::default()
        };
        store.update_bookmark(&bookmark.id, update).unwrap();

        let moved = store.get_bookmark(&bookmark.id).unwrap().unwrap();
        assert_eq!(moved.group_id, DEFAULT_GROUP_ID);
    }

    #[test]
    fn test_remove_bookmark() {
        let mut store = Store::in_memory();
        let keep = add(&mut store, "keep");
        let drop = add(&mut store, "drop");

        assert!(store.remove_bookmark(&drop.id).unwrap());
        assert!(!store.remove_bookmark(&drop.id).unwrap());
        assert_eq!(titles(&mut store), vec![keep.title]);
    }

    #[test]
    fn test_set_read_many() {
        let mut store = Store::in_memory();
        let a = add(&mut store, "a");
        let b = add(&mut store, "b");
        let c = add(&mut store, "c");

        let ids = vec![a.id.clone(), b.id.clone(), "missing".to_string()];
        assert_eq!(store.set_read_many(&ids, true).unwrap(), 2);
        // Already read
        assert_eq!(store.set_read_many(&ids, true).unwrap(), 0);

        let doc = store.get().unwrap();
        assert!(doc.bookmark(&a.id).unwrap().is_read);
        assert!(doc.bookmark(&b.id).unwrap().is_read);
        assert!(!doc.bookmark(&c.id).unwrap().is_read);

        assert_eq!(store.set_read_many(&[a.id.clone()], false).unwrap(), 1);
        assert!(!store.get_bookmark(&a.id).unwrap().unwrap().is_read);
    }

    #[test]
    fn test_tags() {
        let mut store = Store::in_memory();
        let bookmark = add(&mut store, "tagged");

        assert!(store.add_tag(&bookmark.id, " rust ").unwrap());
        assert!(!store.add_tag(&bookmark.id, "rust").unwrap());
        assert!(store.add_tag(&bookmark.id, "web").unwrap());
        assert!(!store.add_tag("missing", "rust").unwrap());
        assert!(store.add_tag(&bookmark.id, "  ").is_err());

        let tags = store.get_bookmark(&bookmark.id).unwrap().unwrap().tags;
        assert_eq!(tags, vec!["rust", "web"]);

        assert!(store.remove_tag(&bookmark.id, "rust").unwrap());
        assert!(!store.remove_tag(&bookmark.id, "rust").unwrap());

        let replacement = vec!["a".to_string(), " b".to_string(), "a".to_string(), "".to_string()];
        assert!(store.set_tags(&bookmark.id, &replacement).unwrap());
        assert!(!store.set_tags(&bookmark.id, &replacement).unwrap());
        let tags = store.get_bookmark(&bookmark.id).unwrap().unwrap().tags;
        assert_eq!(tags, vec!["a", "b"]);
    }

    #[test]
    fn test_add_group_order_is_count() {
        let mut store = Store::in_memory();
        let work = store.add_group("Work").unwrap();
        let home = store.add_group("Home").unwrap();

        assert_eq!(work.order, 1);
        assert_eq!(home.order, 2);

        // Deletion does not renumber
        store.delete_group(&work.id).unwrap();
        let later = store.add_group("Later").unwrap();
        assert_eq!(later.order, 2);

        let names: Vec<String> = store.get_groups().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Default", "Home", "Later"]);
    }

    #[test]
    fn test_add_group_rejects_blank_name() {
        let mut store = Store::in_memory();
        assert!(store.add_group("   ").unwrap_err().is_validation());
    }

    #[test]
    fn test_update_group() {
        let mut store = Store::in_memory();
        let group = store.add_group("Work").unwrap();

        assert!(store
            .update_group(&group.id, GroupUpdate::rename("Office"))
            .unwrap());
        assert_eq!(store.group_name(&group.id).unwrap(), "Office");
        assert_eq!(store.group_name("missing").unwrap(), "Unknown");
        assert!(!store.update_group("missing", GroupUpdate::rename("x")).unwrap());
    }

    #[test]
    fn test_update_group_rejects_blank_name() {
        let mut store = Store::in_memory();
        let group = store.add_group("Work").unwrap();

        let err = store
            .update_group(&group.id, GroupUpdate::rename(""))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.group_name(&group.id).unwrap(), "Work");
    }

    #[test]
    fn test_delete_group_reassigns_bookmarks() {
        let mut store = Store::in_memory();
        let group = store.add_group("g1").unwrap();
        let bookmark = store
            .add_bookmark(NewBookmark::new("a", "https://a").in_group(&group.id))
            .unwrap();

        assert!(store.delete_group(&group.id).unwrap());

        let doc = store.get().unwrap();
        assert!(!doc.has_group(&group.id));
        assert_eq!(doc.bookmark(&bookmark.id).unwrap().group_id, DEFAULT_GROUP_ID);
        assert!(!store.delete_group(&group.id).unwrap());
    }

    #[test]
    fn test_default_group_is_protected() {
        let mut store = Store::in_memory();
        add(&mut store, "a");
        let before = store.get().unwrap();

        assert!(!store.delete_group(DEFAULT_GROUP_ID).unwrap());
        assert!(!store
            .update_group(DEFAULT_GROUP_ID, GroupUpdate::rename("Renamed"))
            .unwrap());
        assert_eq!(store.get().unwrap(), before);
    }

    #[test]
    fn test_theme_defaults_to_system_preference() {
        let mut store = Store::in_memory();
        assert_eq!(store.theme(true).unwrap(), Theme::Dark);
        assert_eq!(store.theme(false).unwrap(), Theme::Light);
        assert!(store.settings().unwrap().is_none());
    }

    #[test]
    fn test_set_theme_creates_settings() {
        let mut store = Store::in_memory();
        store.set_theme(Theme::Dark).unwrap();

        let settings = store.settings().unwrap().unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.items_per_page, 20);
        assert_eq!(settings.date_format, "MM-dd HH:mm");
        assert_eq!(store.theme(false).unwrap(), Theme::Dark);
    }

    #[test]
    fn test_toggle_theme() {
        let mut store = Store::in_memory();
        assert_eq!(store.toggle_theme(true).unwrap(), Theme::Light);
        assert_eq!(store.toggle_theme(true).unwrap(), Theme::Dark);
        assert_eq!(store.settings().unwrap().unwrap().theme, Theme::Dark);
    }

    #[test]
    fn test_search_history_moves_repeat_to_front() {
        let mut store = Store::in_memory();
        store.save_search("x").unwrap();
        store.save_search("y").unwrap();
        store.save_search("x").unwrap();

        let queries: Vec<String> = store
            .search_history()
            .unwrap()
            .into_iter()
            .map(|h| h.query)
            .collect();
        assert_eq!(queries, vec!["x", "y"]);
    }

    #[test]
    fn test_search_history_is_capped() {
        let mut store = Store::in_memory();
        for i in 0..=MAX_SEARCH_HISTORY {
            store.save_search(&format!("q{}", i)).unwrap();
        }

        let history = store.search_history().unwrap();
        assert_eq!(history.len(), MAX_SEARCH_HISTORY);
        assert_eq!(history[0].query, format!("q{}", MAX_SEARCH_HISTORY));

        assert!(!store.save_search("   ").unwrap());
        store.clear_search_history().unwrap();
        assert!(store.search_history().unwrap().is_empty());
    }

    #[test]
    fn test_backup_create_restore_delete() {
        let mut store = Store::in_memory();
        let original = add(&mut store, "original");
        store.save_search("kept").unwrap();

        let backup = store.create_backup().unwrap();
        assert_eq!(backup.data.bookmarks.len(), 1);
        assert!(backup.data.search_history.is_none());
        assert_eq!(
            backup.size,
            serde_json::to_vec(&backup.data).unwrap().len() as u64
        );

        store.remove_bookmark(&original.id).unwrap();
        add(&mut store, "after");

        assert!(store.restore_backup(&backup.id).unwrap());
        assert_eq!(titles(&mut store), vec!["original"]);
        assert_eq!(store.search_history().unwrap().len(), 1);

        assert!(!store.restore_backup("missing").unwrap());
        assert!(store.delete_backup(&backup.id).unwrap());
        assert!(store.backups().unwrap().is_empty());
        assert!(!store.delete_backup(&backup.id).unwrap());
    }

    #[test]
    fn test_backups_newest_first() {
        let mut store = Store::in_memory();
        let first = store.create_backup().unwrap();
        let second = store.create_backup().unwrap();

        let ids: Vec<String> = store.backups().unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_merge_import_keeps_existing_values() {
        let mut store = Store::in_memory();
        let local = add(&mut store, "local");

        let mut incoming = StorageSchema::default();
        let mut clash = local.clone();
        clash.title = "imported".to_string();
        clash.is_read = true;
        incoming.bookmarks.push(clash);

        let summary = store.apply_import(incoming, ImportMode::Merge).unwrap();

        assert_eq!(summary.bookmarks_skipped, 1);
        assert_eq!(store.get_bookmark(&local.id).unwrap(), Some(local));
        assert_eq!(store.get().unwrap().bookmarks.len(), 1);
    }

    #[test]
    fn test_replace_import_discards_collections() {
        let mut store = Store::in_memory();
        add(&mut store, "local");
        store.add_group("Old").unwrap();
        store.set_theme(Theme::Dark).unwrap();

        let mut incoming = StorageSchema::default();
        incoming.bookmarks.push(Bookmark {
            id: "b1".to_string(),
            title: "imported".to_string(),
            url: "https://imported".to_string(),
            group_id: "gone".to_string(),
            created_at: 1,
            updated_at: None,
            order: None,
            tags: Vec::new(),
            is_read: false,
            notes: None,
        });

        let summary = store.apply_import(incoming, ImportMode::Replace).unwrap();

        let doc = store.get().unwrap();
        assert_eq!(doc.bookmarks.len(), 1);
        assert_eq!(doc.bookmarks[0].group_id, DEFAULT_GROUP_ID);
        assert_eq!(doc.groups, vec![Group::default_group()]);
        assert_eq!(summary.reassigned, 1);
        // Settings survive an import
        assert_eq!(doc.settings.unwrap().theme, Theme::Dark);
    }

    #[test]
    fn test_csv_round_trip_replace() {
        let mut store = Store::in_memory();
        let first = add(&mut store, "first");
        store.add_tag(&first.id, "rust").unwrap();
        store.add_tag(&first.id, "web dev").unwrap();
        let second = store
            .add_bookmark(NewBookmark::new(r#"Say "hi", then leave"#, "https://quote.example"))
            .unwrap();
        store.set_read_many(&[second.id.clone()], true).unwrap();

        let before = store.get().unwrap().bookmarks;
        let csv = store.export_csv().unwrap();

        let report = store.prepare_import(&csv, ExportFormat::Csv).unwrap();
        assert!(report.success);
        store
            .apply_import(report.data.unwrap(), ImportMode::Replace)
            .unwrap();

        let after = store.get().unwrap().bookmarks;
        assert_eq!(after.len(), before.len());
        for (old, new) in before.iter().zip(&after) {
            assert_eq!(new.title, old.title);
            assert_eq!(new.url, old.url);
            assert_eq!(new.tags, old.tags);
            assert_eq!(new.is_read, old.is_read);
        }
    }

    #[test]
    fn test_json_round_trip_replace() {
        let mut store = Store::in_memory();
        add(&mut store, "a");
        store.add_group("Work").unwrap();
        let before = store.get().unwrap();

        let json = store.export_json().unwrap();
        let mut other = Store::in_memory();
        let report = other.prepare_import(&json, ExportFormat::Json).unwrap();
        other
            .apply_import(report.data.unwrap(), ImportMode::Replace)
            .unwrap();

        let after = other.get().unwrap();
        assert_eq!(after.bookmarks, before.bookmarks);
        assert_eq!(after.groups, before.groups);
    }

    #[test]
    fn test_prepare_import_reports_failure() {
        let mut store = Store::in_memory();
        let report = store.prepare_import("not json", ExportFormat::Json).unwrap();

        assert!(!report.success);
        assert_eq!(report.message, "Failed to parse file");
        assert!(report.data.is_none());
    }

    #[test]
    fn test_export_to_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = Store::in_memory();
        add(&mut store, "exported");

        let mut sink = DirectorySink::new(temp_dir.path());
        let path = store.export_to(&mut sink, ExportFormat::Csv).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("web-later-export-"));
        assert!(name.ends_with(".csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"exported\""));
    }

    #[test]
    fn test_sqlite_backend_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir, BackendKind::Sqlite);

        let id = {
            let mut store = Store::open_with_config(&config).unwrap();
            assert_eq!(store.backend_name(), "sqlite");
            add(&mut store, "persisted").id
        };

        let mut store = Store::open_with_config(&config).unwrap();
        assert_eq!(store.get_bookmark(&id).unwrap().unwrap().title, "persisted");
    }

    #[test]
    fn test_file_backend_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir, BackendKind::File);

        {
            let mut store = Store::open_with_config(&config).unwrap();
            assert_eq!(store.backend_name(), "file");
            store.add_group("Work").unwrap();
        }

        assert!(config.mirror_path().exists());
        let mut store = Store::open_with_config(&config).unwrap();
        assert_eq!(store.get_groups().unwrap().len(), 2);
    }

    #[test]
    fn test_file_backend_sees_external_changes() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir, BackendKind::File);

        let mut reader = Store::open_with_config(&config).unwrap();
        let mut writer = Store::open_with_config(&config).unwrap();
        add(&mut writer, "from writer");

        // The mirror is rehydrated before every read
        assert_eq!(titles(&mut reader), vec!["from writer"]);
    }
}
