//! Document import
//!
//! Import never writes: it turns file content into a `StorageSchema` that
//! the caller then applies in merge or replace mode.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::csv::parse_line;
use super::{ImportError, ImportMode, ImportSummary};
use crate::models::{generate_id, now_millis, Bookmark, Group, StorageSchema, DEFAULT_GROUP_ID};

/// Parse a JSON export (or a bare document) into a document
///
/// An object carrying both `version` and `data` is treated as an export
/// envelope and its `data` is imported; anything else is imported as is.
pub fn import_json(content: &str) -> Result<StorageSchema, ImportError> {
    let parsed: Value = serde_json::from_str(content).map_err(|_| ImportError::ParseFailed)?;

    let payload = if is_truthy(&parsed["version"]) && is_truthy(&parsed["data"]) {
        &parsed["data"]
    } else {
        &parsed
    };

    validate_payload(payload)?;
    serde_json::from_value(payload.clone()).map_err(|_| ImportError::InvalidFormat)
}

/// Check the minimum shape of an imported document
///
/// Requires array `bookmarks` and `groups`, non-empty `id`, `title`, `url`
/// and `groupId` on every bookmark, and non-empty `id` and `name` on every
/// group.
pub fn validate_payload(payload: &Value) -> Result<(), ImportError> {
    let object = payload.as_object().ok_or(ImportError::InvalidFormat)?;

    let bookmarks = object
        .get("bookmarks")
        .and_then(Value::as_array)
        .ok_or(ImportError::InvalidFormat)?;
    let groups = object
        .get("groups")
        .and_then(Value::as_array)
        .ok_or(ImportError::InvalidFormat)?;

    let complete = |entry: &Value, fields: &[&str]| {
        fields.iter().all(|field| {
            entry
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty())
        })
    };

    if !bookmarks
        .iter()
        .all(|b| complete(b, &["id", "title", "url", "groupId"]))
    {
        return Err(ImportError::InvalidFormat);
    }

    if !groups.iter().all(|g| complete(g, &["id", "name"])) {
        return Err(ImportError::InvalidFormat);
    }

    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// What a CSV header column maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Title,
    Url,
    Group,
    Tags,
    Created,
    Updated,
    Read,
    Notes,
    Ignored,
}

impl Column {
    /// Classify a header cell by the first token it contains
    fn classify(header: &str) -> Self {
        let header = header.trim().to_lowercase();
        const TOKENS: [(&str, Column); 8] = [
            ("title", Column::Title),
            ("url", Column::Url),
            ("group", Column::Group),
            ("tag", Column::Tags),
            ("created", Column::Created),
            ("updated", Column::Updated),
            ("read", Column::Read),
            ("note", Column::Notes),
        ];

        TOKENS
            .iter()
            .find(|(token, _)| header.contains(token))
            .map(|(_, column)| *column)
            .unwrap_or(Column::Ignored)
    }
}

/// Resolves Group column values to group ids, creating groups on demand
struct GroupResolver {
    lookup: HashMap<String, String>,
    existing: usize,
    created: Vec<Group>,
}

impl GroupResolver {
    fn new(existing: &[Group]) -> Self {
        let mut lookup = HashMap::new();
        for group in existing {
            lookup.insert(group.name.to_lowercase(), group.id.clone());
            lookup.insert(group.id.to_lowercase(), group.id.clone());
        }
        Self {
            lookup,
            existing: existing.len(),
            created: Vec::new(),
        }
    }

    /// Group id for a cell value; `None` for a blank cell
    fn resolve(&mut self, value: &str) -> Option<String> {
        let name = value.trim();
        if name.is_empty() {
            return None;
        }

        let key = name.to_lowercase();
        if let Some(id) = self.lookup.get(&key) {
            return Some(id.clone());
        }

        let group = Group::new(
            generate_id(),
            name,
            (self.existing + self.created.len()) as i64,
        );
        self.lookup.insert(key, group.id.clone());
        self.lookup.insert(group.id.to_lowercase(), group.id.clone());
        let id = group.id.clone();
        self.created.push(group);
        Some(id)
    }
}

/// Fields collected from one CSV row
#[derive(Default)]
struct Row {
    title: Option<String>,
    url: Option<String>,
    group_id: Option<String>,
    tags: Option<Vec<String>>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
    is_read: Option<bool>,
    notes: Option<String>,
}

/// Parse a CSV export into a document
///
/// The first non-blank line is the header. Rows without both a title and
/// a url are dropped. Group cells are matched case-insensitively against
/// `existing_groups` by name or id; an unknown name creates a new group.
/// The returned document holds the imported bookmarks and the existing
/// groups followed by any created ones.
pub fn import_csv(content: &str, existing_groups: &[Group]) -> Result<StorageSchema, ImportError> {
    let lines: Vec<&str> = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(ImportError::EmptyCsv);
    }

    let columns: Vec<Column> = lines[0].split(',').map(Column::classify).collect();
    let mut groups = GroupResolver::new(existing_groups);
    let now = now_millis();
    let mut bookmarks = Vec::new();

    for line in &lines[1..] {
        let values = parse_line(line);
        let mut row = Row::default();

        for (index, column) in columns.iter().enumerate() {
            let value = values.get(index).map(String::as_str).unwrap_or("");
            match column {
                Column::Title => row.title = Some(value.to_string()),
                Column::Url => row.url = Some(value.to_string()),
                Column::Group => row.group_id = groups.resolve(value),
                Column::Tags => {
                    row.tags = Some(
                        value
                            .split(',')
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                            .map(str::to_string)
                            .collect(),
                    )
                }
                Column::Created => row.created_at = parse_int(value),
                Column::Updated => row.updated_at = parse_int(value),
                Column::Read => row.is_read = Some(value.eq_ignore_ascii_case("yes")),
                Column::Notes => row.notes = Some(value.to_string()),
                Column::Ignored => {}
            }
        }

        let (title, url) = match (row.title, row.url) {
            (Some(title), Some(url)) if !title.is_empty() && !url.is_empty() => (title, url),
            _ => continue,
        };

        bookmarks.push(Bookmark {
            id: generate_id(),
            title,
            url,
            group_id: row
                .group_id
                .unwrap_or_else(|| DEFAULT_GROUP_ID.to_string()),
            created_at: row.created_at.unwrap_or(now),
            updated_at: row.updated_at,
            order: None,
            tags: row.tags.unwrap_or_default(),
            is_read: row.is_read.unwrap_or(false),
            notes: row.notes,
        });
    }

    let mut all_groups = existing_groups.to_vec();
    all_groups.extend(groups.created);

    Ok(StorageSchema {
        bookmarks,
        groups: all_groups,
        settings: None,
        backups: None,
        search_history: None,
    })
}

/// Integer prefix parse: optional sign, then digits, surrounding space ignored
fn parse_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Combine an imported document with the current one
///
/// Merge keeps every current entity and appends incoming ones whose id is
/// not taken yet. Replace takes the incoming bookmarks and groups as they
/// are. Either way the result is repaired so the default group exists and
/// no bookmark points at a missing group. Other keys of `current` are not
/// touched.
pub fn combine(
    current: &StorageSchema,
    incoming: StorageSchema,
    mode: ImportMode,
) -> (StorageSchema, ImportSummary) {
    let mut summary = ImportSummary::default();
    let mut result = current.clone();

    match mode {
        ImportMode::Merge => {
            let mut bookmark_ids: HashSet<String> =
                current.bookmarks.iter().map(|b| b.id.clone()).collect();
            for bookmark in incoming.bookmarks {
                if bookmark_ids.insert(bookmark.id.clone()) {
                    result.bookmarks.push(bookmark);
                    summary.bookmarks_added += 1;
                } else {
                    summary.bookmarks_skipped += 1;
                }
            }

            let mut group_ids: HashSet<String> =
                current.groups.iter().map(|g| g.id.clone()).collect();
            for group in incoming.groups {
                if group_ids.insert(group.id.clone()) {
                    result.groups.push(group);
                    summary.groups_added += 1;
                } else {
                    summary.groups_skipped += 1;
                }
            }
        }
        ImportMode::Replace => {
            summary.bookmarks_added = incoming.bookmarks.len();
            summary.groups_added = incoming.groups.len();
            result.bookmarks = incoming.bookmarks;
            result.groups = incoming.groups;
        }
    }

    summary.reassigned = result.repair();
    (result, summary)
}
