//! Tag command handlers

use anyhow::{Context, Result};

use later_core::projection::tag_counts;
use later_core::Store;

use super::bookmark::resolve_bookmark_id;
use super::split_list;
use crate::output::Output;

/// List all tags with usage counts
pub fn list(store: &mut Store, output: &Output) -> Result<()> {
    let doc = store.get()?;
    output.print_tags(&tag_counts(&doc.bookmarks));
    Ok(())
}

/// Add tags to a bookmark, skipping ones it already has
pub fn add(store: &mut Store, id: String, tags: Vec<String>, output: &Output) -> Result<()> {
    let id = resolve_bookmark_id(store, &id)?;

    let mut added = 0;
    for tag in &tags {
        if store.add_tag(&id, tag).context("Failed to add tag")? {
            added += 1;
        }
    }

    output.success(&format!("Added {} tag(s)", added));
    Ok(())
}

pub fn remove(store: &mut Store, id: String, tags: Vec<String>, output: &Output) -> Result<()> {
    let id = resolve_bookmark_id(store, &id)?;

    let mut removed = 0;
    for tag in &tags {
        if store.remove_tag(&id, tag).context("Failed to remove tag")? {
            removed += 1;
        }
    }

    output.success(&format!("Removed {} tag(s)", removed));
    Ok(())
}

/// Replace all tags of a bookmark with a comma-separated list
pub fn set(store: &mut Store, id: String, tags: String, output: &Output) -> Result<()> {
    let id = resolve_bookmark_id(store, &id)?;
    let tags = split_list(&tags);

    store.set_tags(&id, &tags).context("Failed to set tags")?;

    if tags.is_empty() {
        output.success("Cleared tags");
    } else {
        output.success(&format!("Tags set: {}", tags.join(", ")));
    }
    Ok(())
}
