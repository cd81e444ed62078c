//! Data models for web-later
//!
//! Defines the persisted document and the entities it holds: bookmarks,
//! groups, settings, backups and search history. Fields serialize in
//! camelCase so stored values and exported files keep the browser
//! extension's storage shape.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use uuid::Uuid;

/// Id of the permanent group every orphaned bookmark falls back to
pub const DEFAULT_GROUP_ID: &str = "default";

/// Display name of the permanent group in a fresh document
pub const DEFAULT_GROUP_NAME: &str = "Default";

/// Top-level keys of the persisted document
pub mod keys {
    pub const BOOKMARKS: &str = "bookmarks";
    pub const GROUPS: &str = "groups";
    pub const SETTINGS: &str = "settings";
    pub const BACKUPS: &str = "backups";
    pub const SEARCH_HISTORY: &str = "searchHistory";

    /// Every key a write may carry
    pub const ALL: [&str; 5] = [BOOKMARKS, GROUPS, SETTINGS, BACKUPS, SEARCH_HISTORY];
}

/// Generate a fresh entity id (random v4 UUID)
///
/// There is no non-cryptographic fallback: `Uuid::new_v4` draws from the
/// operating system's random source, which every supported platform has.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// Stored and imported documents may come from a looser writer: numbers can
// be floats, optional fields can be null or missing.

fn number_to_int(number: Number) -> Option<i64> {
    number
        .as_i64()
        .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
}

fn optional_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Number>::deserialize(deserializer)?.and_then(number_to_int))
}

fn int_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_int(deserializer)?.unwrap_or(0))
}

fn millis_or_now<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_int(deserializer)?.unwrap_or_else(now_millis))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A saved link with its group, tags and read state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Unique identifier, never reused
    pub id: String,
    pub title: String,
    pub url: String,
    /// Owning group
    pub group_id: String,
    /// Creation time (epoch ms), immutable; read as now when missing
    #[serde(default = "now_millis", deserialize_with = "millis_or_now")]
    pub created_at: i64,
    /// Last update time (epoch ms), only stamped when the caller asks
    #[serde(
        default,
        deserialize_with = "optional_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<i64>,
    /// Manual ordering position
    #[serde(
        default,
        deserialize_with = "optional_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub order: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Bookmark {
    /// Shallow-merge an update into this bookmark
    ///
    /// Only the fields present in `update` change. `updated_at` is not
    /// stamped implicitly.
    pub fn apply(&mut self, update: BookmarkUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(url) = update.url {
            self.url = url;
        }
        if let Some(group_id) = update.group_id {
            self.group_id = group_id;
        }
        if let Some(updated_at) = update.updated_at {
            self.updated_at = Some(updated_at);
        }
        if let Some(order) = update.order {
            self.order = Some(order);
        }
        if let Some(tags) = update.tags {
            self.tags = tags;
        }
        if let Some(is_read) = update.is_read {
            self.is_read = is_read;
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
    }

    /// Check whether the bookmark carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Fields for a bookmark that has not been saved yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    /// Target group; missing or unknown ids land in the default group
    pub group_id: Option<String>,
    pub order: Option<i64>,
    pub tags: Vec<String>,
    pub is_read: bool,
    pub notes: Option<String>,
}

impl NewBookmark {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial bookmark update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub group_id: Option<String>,
    pub updated_at: Option<i64>,
    pub order: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub is_read: Option<bool>,
    pub notes: Option<String>,
}

impl BookmarkUpdate {
    /// True when the update carries no field at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Stamp `updated_at` with the current time
    pub fn touched(mut self) -> Self {
        self.updated_at = Some(now_millis());
        self
    }
}

/// A user-defined category of bookmarks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Position assigned at creation; not renumbered on deletion
    #[serde(default, deserialize_with = "int_or_zero")]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
            parent_id: None,
            color: None,
        }
    }

    /// The permanent group present in every document
    pub fn default_group() -> Self {
        Self::new(DEFAULT_GROUP_ID, DEFAULT_GROUP_NAME, 0)
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_GROUP_ID
    }

    pub fn apply(&mut self, update: GroupUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(order) = update.order {
            self.order = order;
        }
        if let Some(parent_id) = update.parent_id {
            self.parent_id = Some(parent_id);
        }
        if let Some(color) = update.color {
            self.color = Some(color);
        }
    }
}

/// Partial group update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub order: Option<i64>,
    pub parent_id: Option<String>,
    pub color: Option<String>,
}

impl GroupUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Color theme
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Pick the theme matching a system dark-mode preference
    pub fn from_preference(prefers_dark: bool) -> Self {
        if prefers_dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{}', expected light or dark", other)),
        }
    }
}

/// User preferences, created lazily on the first theme change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    pub default_group_id: String,
    pub auto_mark_as_read: bool,
    pub date_format: String,
    pub items_per_page: u32,
    pub enable_backup: bool,
    /// Hours between automatic backups
    pub backup_interval: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            default_group_id: DEFAULT_GROUP_ID.to_string(),
            auto_mark_as_read: false,
            date_format: "MM-dd HH:mm".to_string(),
            items_per_page: 20,
            enable_backup: false,
            backup_interval: 24,
        }
    }
}

/// A snapshot of bookmarks and groups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub id: String,
    pub timestamp: i64,
    pub data: StorageSchema,
    /// Serialized size of `data` in bytes
    pub size: u64,
}

/// One remembered search query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHistory {
    pub query: String,
    pub timestamp: i64,
}

/// The whole persisted document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageSchema {
    /// Newest first
    pub bookmarks: Vec<Bookmark>,
    pub groups: Vec<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backups: Option<Vec<Backup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_history: Option<Vec<SearchHistory>>,
}

impl Default for StorageSchema {
    fn default() -> Self {
        Self {
            bookmarks: Vec::new(),
            groups: vec![Group::default_group()],
            settings: None,
            backups: None,
            search_history: None,
        }
    }
}

impl StorageSchema {
    /// Build a document from stored keys
    ///
    /// Missing `bookmarks` become empty, missing `groups` become the
    /// single default group.
    pub fn from_stored(stored: DocumentPatch) -> Self {
        Self {
            bookmarks: stored.bookmarks.unwrap_or_default(),
            groups: stored
                .groups
                .unwrap_or_else(|| vec![Group::default_group()]),
            settings: stored.settings,
            backups: stored.backups,
            search_history: stored.search_history,
        }
    }

    /// Overwrite every key present in the patch (shallow merge)
    pub fn apply(&mut self, patch: DocumentPatch) {
        if let Some(bookmarks) = patch.bookmarks {
            self.bookmarks = bookmarks;
        }
        if let Some(groups) = patch.groups {
            self.groups = groups;
        }
        if let Some(settings) = patch.settings {
            self.settings = Some(settings);
        }
        if let Some(backups) = patch.backups {
            self.backups = Some(backups);
        }
        if let Some(search_history) = patch.search_history {
            self.search_history = Some(search_history);
        }
    }

    pub fn has_group(&self, id: &str) -> bool {
        self.groups.iter().any(|g| g.id == id)
    }

    pub fn bookmark(&self, id: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    /// Restore the group invariants after a bulk replacement
    ///
    /// Puts the default group back if it is missing and moves bookmarks
    /// that point at unknown groups into it. Returns the number of
    /// bookmarks reassigned.
    pub fn repair(&mut self) -> usize {
        if !self.has_group(DEFAULT_GROUP_ID) {
            self.groups.insert(0, Group::default_group());
        }

        let mut reassigned = 0;
        for i in 0..self.bookmarks.len() {
            if !self.has_group(&self.bookmarks[i].group_id) {
                self.bookmarks[i].group_id = DEFAULT_GROUP_ID.to_string();
                reassigned += 1;
            }
        }
        reassigned
    }
}

/// A partial document: the keys of one write, or the keys a backend holds
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmarks: Option<Vec<Bookmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backups: Option<Vec<Backup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_history: Option<Vec<SearchHistory>>,
}

impl DocumentPatch {
    pub fn with_bookmarks(mut self, bookmarks: Vec<Bookmark>) -> Self {
        self.bookmarks = Some(bookmarks);
        self
    }

    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_backups(mut self, backups: Vec<Backup>) -> Self {
        self.backups = Some(backups);
        self
    }

    pub fn with_search_history(mut self, history: Vec<SearchHistory>) -> Self {
        self.search_history = Some(history);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Names of the keys present in this patch
    pub fn keys(&self) -> Vec<&'static str> {
        let mut present = Vec::new();
        if self.bookmarks.is_some() {
            present.push(keys::BOOKMARKS);
        }
        if self.groups.is_some() {
            present.push(keys::GROUPS);
        }
        if self.settings.is_some() {
            present.push(keys::SETTINGS);
        }
        if self.backups.is_some() {
            present.push(keys::BACKUPS);
        }
        if self.search_history.is_some() {
            present.push(keys::SEARCH_HISTORY);
        }
        present
    }

    /// Layer another patch on top of this one
    pub fn merge(&mut self, other: &DocumentPatch) {
        if let Some(ref bookmarks) = other.bookmarks {
            self.bookmarks = Some(bookmarks.clone());
        }
        if let Some(ref groups) = other.groups {
            self.groups = Some(groups.clone());
        }
        if let Some(ref settings) = other.settings {
            self.settings = Some(settings.clone());
        }
        if let Some(ref backups) = other.backups {
            self.backups = Some(backups.clone());
        }
        if let Some(ref history) = other.search_history {
            self.search_history = Some(history.clone());
        }
    }
}

impl From<StorageSchema> for DocumentPatch {
    fn from(doc: StorageSchema) -> Self {
        Self {
            bookmarks: Some(doc.bookmarks),
            groups: Some(doc.groups),
            settings: doc.settings,
            backups: doc.backups,
            search_history: doc.search_history,
        }
    }
}
