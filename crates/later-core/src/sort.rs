//! Sorting and read-status filtering of bookmark lists

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Bookmark;

/// Key a bookmark list is sorted by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortType {
    #[default]
    CreatedAt,
    /// Falls back to `created_at` when never updated
    UpdatedAt,
    Title,
    /// Manual position, 0 when unset
    Order,
}

impl FromStr for SortType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "createdat" | "created" => Ok(SortType::CreatedAt),
            "updatedat" | "updated" => Ok(SortType::UpdatedAt),
            "title" => Ok(SortType::Title),
            "order" => Ok(SortType::Order),
            other => Err(format!(
                "unknown sort '{}', expected created, updated, title or order",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}', expected asc or desc", other)),
        }
    }
}

/// Sort key and direction; newest first by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOptions {
    #[serde(rename = "type")]
    pub sort_type: SortType,
    pub order: SortOrder,
}

impl SortOptions {
    pub fn new(sort_type: SortType, order: SortOrder) -> Self {
        Self { sort_type, order }
    }
}

/// Stable sort of a bookmark list
///
/// Descending order negates the comparison, so bookmarks that compare equal
/// keep their relative order either way.
pub fn sort_bookmarks<B: Borrow<Bookmark>>(items: &mut [B], options: SortOptions) {
    items.sort_by(|a, b| {
        let ordering = compare(a.borrow(), b.borrow(), options.sort_type);
        match options.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

fn compare(a: &Bookmark, b: &Bookmark, sort_type: SortType) -> Ordering {
    match sort_type {
        SortType::CreatedAt => a.created_at.cmp(&b.created_at),
        SortType::UpdatedAt => a
            .updated_at
            .unwrap_or(a.created_at)
            .cmp(&b.updated_at.unwrap_or(b.created_at)),
        SortType::Title => locale_compare(&a.title, &b.title),
        SortType::Order => a.order.unwrap_or(0).cmp(&b.order.unwrap_or(0)),
    }
}

/// Human-friendly string ordering
///
/// Case-insensitive first; on a tie lowercase sorts before uppercase.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Which bookmarks a read-status filter lets through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStatusFilter {
    #[default]
    All,
    Read,
    Unread,
}

impl ReadStatusFilter {
    pub fn accepts(self, bookmark: &Bookmark) -> bool {
        match self {
            ReadStatusFilter::All => true,
            ReadStatusFilter::Read => bookmark.is_read,
            ReadStatusFilter::Unread => !bookmark.is_read,
        }
    }
}

impl fmt::Display for ReadStatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadStatusFilter::All => write!(f, "all"),
            ReadStatusFilter::Read => write!(f, "read"),
            ReadStatusFilter::Unread => write!(f, "unread"),
        }
    }
}

impl FromStr for ReadStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ReadStatusFilter::All),
            "read" => Ok(ReadStatusFilter::Read),
            "unread" => Ok(ReadStatusFilter::Unread),
            other => Err(format!(
                "unknown status '{}', expected all, read or unread",
                other
            )),
        }
    }
}

/// Keep the bookmarks accepted by `filter`
pub fn filter_by_read_status<'a, I>(bookmarks: I, filter: ReadStatusFilter) -> Vec<&'a Bookmark>
where
    I: IntoIterator<Item = &'a Bookmark>,
{
    bookmarks
        .into_iter()
        .filter(|b| filter.accepts(b))
        .collect()
}
