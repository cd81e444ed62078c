//! Read-only projections over an in-memory document snapshot
//!
//! None of these go back to storage; callers pass the collections they
//! already hold.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::{Bookmark, Group};

/// Name shown for a group id that does not exist
pub const UNKNOWN_GROUP_NAME: &str = "Unknown";

/// Every distinct tag, sorted
pub fn all_tags(bookmarks: &[Bookmark]) -> Vec<String> {
    bookmarks
        .iter()
        .flat_map(|b| b.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Tags with the number of bookmarks carrying each, sorted by tag
pub fn tag_counts(bookmarks: &[Bookmark]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for bookmark in bookmarks {
        for tag in &bookmark.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(tag, count)| (tag.to_string(), count))
        .collect()
}

pub fn bookmarks_by_tag<'a>(bookmarks: &'a [Bookmark], tag: &str) -> Vec<&'a Bookmark> {
    bookmarks.iter().filter(|b| b.has_tag(tag)).collect()
}

pub fn bookmarks_in_group<'a>(bookmarks: &'a [Bookmark], group_id: &str) -> Vec<&'a Bookmark> {
    bookmarks.iter().filter(|b| b.group_id == group_id).collect()
}

/// Read/unread tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadCounts {
    pub read: usize,
    pub unread: usize,
}

impl ReadCounts {
    pub fn total(&self) -> usize {
        self.read + self.unread
    }
}

pub fn read_counts(bookmarks: &[Bookmark]) -> ReadCounts {
    let read = bookmarks.iter().filter(|b| b.is_read).count();
    ReadCounts {
        read,
        unread: bookmarks.len() - read,
    }
}

/// Display name of a group, or `"Unknown"`
pub fn group_name<'a>(groups: &'a [Group], id: &str) -> &'a str {
    groups
        .iter()
        .find(|g| g.id == id)
        .map(|g| g.name.as_str())
        .unwrap_or(UNKNOWN_GROUP_NAME)
}
