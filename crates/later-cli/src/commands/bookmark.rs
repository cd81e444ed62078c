//! Bookmark command handlers

use anyhow::{bail, Context, Result};

use later_core::models::{Bookmark, BookmarkUpdate, NewBookmark};
use later_core::projection::bookmarks_by_tag;
use later_core::search::search_bookmarks;
use later_core::sort::{filter_by_read_status, sort_bookmarks, ReadStatusFilter, SortOptions};
use later_core::Store;

use super::confirm;
use super::group::resolve_group;
use crate::output::Output;

/// Filters and ordering for `list`
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub group: Option<String>,
    pub tag: Option<String>,
    pub status: ReadStatusFilter,
    pub search: Option<String>,
    pub sort: SortOptions,
}

/// Save a new bookmark
pub fn add(
    store: &mut Store,
    url: String,
    title: Option<String>,
    group: Option<String>,
    tags: Vec<String>,
    notes: Option<String>,
    output: &Output,
) -> Result<()> {
    let title = title.unwrap_or_else(|| url.clone());
    let mut new = NewBookmark::new(title, url).with_tags(tags);

    if let Some(ref group) = group {
        new = new.in_group(resolve_group(store, group)?.id);
    }
    if let Some(notes) = notes {
        new = new.with_notes(notes);
    }

    let bookmark = store.add_bookmark(new).context("Failed to add bookmark")?;
    let groups = store.get_groups()?;

    output.success(&format!("Saved bookmark: {}", bookmark.id));
    output.print_bookmark(&bookmark, &groups);
    Ok(())
}

/// List bookmarks, newest first unless another sort is given
pub fn list(store: &mut Store, filter: ListFilter, output: &Output) -> Result<()> {
    let doc = store.get()?;

    let mut bookmarks: Vec<&Bookmark> = match filter.tag {
        Some(ref tag) => bookmarks_by_tag(&doc.bookmarks, tag),
        None => doc.bookmarks.iter().collect(),
    };

    if let Some(ref group) = filter.group {
        let group_id = resolve_group(store, group)?.id;
        bookmarks.retain(|b| b.group_id == group_id);
    }

    let mut bookmarks = filter_by_read_status(bookmarks, filter.status);
    if let Some(ref query) = filter.search {
        bookmarks = search_bookmarks(bookmarks, query);
    }
    sort_bookmarks(&mut bookmarks, filter.sort);

    output.print_bookmarks(&bookmarks, &doc.groups);
    Ok(())
}

/// Show a single bookmark
pub fn show(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let doc = store.get()?;
    let bookmark = find_by_prefix(&doc.bookmarks, &id)?;

    output.print_bookmark(bookmark, &doc.groups);
    Ok(())
}

/// Change fields of a bookmark and stamp its update time
#[allow(clippy::too_many_arguments)]
pub fn update(
    store: &mut Store,
    id: String,
    title: Option<String>,
    url: Option<String>,
    group: Option<String>,
    notes: Option<String>,
    order: Option<i64>,
    output: &Output,
) -> Result<()> {
    let id = resolve_bookmark_id(store, &id)?;

    let group_id = match group {
        Some(ref group) => Some(resolve_group(store, group)?.id),
        None => None,
    };

    let update = BookmarkUpdate {
        title,
        url,
        group_id,
        notes,
        order,
        ..Default::default()
    };
    if update.is_empty() {
        bail!("Nothing to update. Pass at least one of --title, --url, --group, --notes, --order.");
    }

    store
        .update_bookmark(&id, update.touched())
        .context("Failed to update bookmark")?;

    let doc = store.get()?;
    let bookmark = find_by_prefix(&doc.bookmarks, &id)?;
    output.success("Bookmark updated");
    output.print_bookmark(bookmark, &doc.groups);
    Ok(())
}

/// Delete a bookmark
pub fn remove(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let doc = store.get()?;
    let bookmark = find_by_prefix(&doc.bookmarks, &id)?;

    // Confirm deletion
    if output.should_prompt() {
        println!("Delete bookmark: {} - {}", bookmark.id, bookmark.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .remove_bookmark(&bookmark.id)
        .context("Failed to delete bookmark")?;

    output.success(&format!("Deleted bookmark: {}", bookmark.id));
    Ok(())
}

/// Mark bookmarks read or unread in one write
pub fn set_read(store: &mut Store, ids: Vec<String>, is_read: bool, output: &Output) -> Result<()> {
    let doc = store.get()?;
    let resolved = ids
        .iter()
        .map(|id| find_by_prefix(&doc.bookmarks, id).map(|b| b.id.clone()))
        .collect::<Result<Vec<_>>>()?;

    let changed = store
        .set_read_many(&resolved, is_read)
        .context("Failed to update read status")?;

    let state = if is_read { "read" } else { "unread" };
    if changed == 0 {
        output.message(&format!("Already {}, nothing changed.", state));
    } else {
        output.success(&format!("Marked {} bookmark(s) as {}", changed, state));
    }
    Ok(())
}

/// Resolve a full bookmark id or unique prefix to the full id
pub fn resolve_bookmark_id(store: &mut Store, id: &str) -> Result<String> {
    let doc = store.get()?;
    Ok(find_by_prefix(&doc.bookmarks, id)?.id.clone())
}

/// Find a bookmark by full id or unique id prefix
pub fn find_by_prefix<'a>(bookmarks: &'a [Bookmark], id: &str) -> Result<&'a Bookmark> {
    if id.is_empty() {
        bail!("Bookmark ID must not be empty");
    }

    // Try full id first
    if let Some(bookmark) = bookmarks.iter().find(|b| b.id == id) {
        return Ok(bookmark);
    }

    // Try prefix match
    let matches: Vec<&Bookmark> = bookmarks.iter().filter(|b| b.id.starts_with(id)).collect();

    match matches.len() {
        0 => bail!("No bookmark found matching: {}", id),
        1 => Ok(matches[0]),
        _ => {
            eprintln!("Multiple bookmarks match '{}':", id);
            for bookmark in &matches {
                eprintln!("  {} - {}", bookmark.id, bookmark.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}
