//! Group command handlers

use anyhow::{bail, Context, Result};

use later_core::models::{Group, GroupUpdate};
use later_core::projection::bookmarks_in_group;
use later_core::Store;

use super::confirm;
use crate::output::Output;

/// List groups with their bookmark counts
pub fn list(store: &mut Store, output: &Output) -> Result<()> {
    let doc = store.get()?;
    let groups: Vec<(Group, usize)> = doc
        .groups
        .iter()
        .map(|g| (g.clone(), bookmarks_in_group(&doc.bookmarks, &g.id).len()))
        .collect();

    output.print_groups(&groups);
    Ok(())
}

pub fn create(store: &mut Store, name: String, output: &Output) -> Result<()> {
    let group = store.add_group(&name).context("Failed to create group")?;

    output.success(&format!("Created group: {} ({})", group.name, group.id));
    Ok(())
}

pub fn rename(store: &mut Store, group: String, name: String, output: &Output) -> Result<()> {
    let group = resolve_group(store, &group)?;
    if group.is_default() {
        bail!("The default group cannot be renamed.");
    }

    store
        .update_group(&group.id, GroupUpdate::rename(name.trim()))
        .context("Failed to rename group")?;

    output.success(&format!("Renamed group '{}' to '{}'", group.name, name.trim()));
    Ok(())
}

/// Delete a group; its bookmarks move to the default group
pub fn delete(store: &mut Store, group: String, output: &Output) -> Result<()> {
    let group = resolve_group(store, &group)?;
    if group.is_default() {
        bail!("The default group cannot be deleted.");
    }

    let doc = store.get()?;
    let count = bookmarks_in_group(&doc.bookmarks, &group.id).len();

    if output.should_prompt() {
        println!(
            "Delete group '{}'? {} bookmark(s) will move to the default group.",
            group.name, count
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_group(&group.id)
        .context("Failed to delete group")?;

    output.success(&format!("Deleted group: {}", group.name));
    Ok(())
}

/// Resolve a group by id, name (case-insensitive) or unique id prefix
pub fn resolve_group(store: &mut Store, query: &str) -> Result<Group> {
    let groups = store.get_groups()?;
    find_group(&groups, query).cloned()
}

/// Find a group by id, name (case-insensitive) or unique id prefix
pub fn find_group<'a>(groups: &'a [Group], query: &str) -> Result<&'a Group> {
    let query = query.trim();
    if query.is_empty() {
        bail!("Group must not be empty");
    }

    if let Some(group) = groups.iter().find(|g| g.id == query) {
        return Ok(group);
    }

    let lowered = query.to_lowercase();
    if let Some(group) = groups.iter().find(|g| g.name.to_lowercase() == lowered) {
        return Ok(group);
    }

    let matches: Vec<&Group> = groups.iter().filter(|g| g.id.starts_with(query)).collect();
    match matches.len() {
        0 => bail!("No group found matching: {}", query),
        1 => Ok(matches[0]),
        _ => bail!("Ambiguous group '{}'. Use the name or more of the ID.", query),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use later_core::models::NewBookmark;

    fn groups() -> Vec<Group> {
        vec![
            Group::default_group(),
            Group::new("1a2b3c", "Work", 1),
            Group::new("1a9f00", "Reading", 2),
        ]
    }

    #[test]
    fn test_find_group_by_id_name_and_prefix() {
        let groups = groups();

        assert_eq!(find_group(&groups, "default").unwrap().name, "Default");
        assert_eq!(find_group(&groups, "work").unwrap().id, "1a2b3c");
        assert_eq!(find_group(&groups, " READING ").unwrap().id, "1a9f00");
        assert_eq!(find_group(&groups, "1a2").unwrap().name, "Work");
    }

    #[test]
    fn test_find_group_failures() {
        let groups = groups();

        assert!(find_group(&groups, "1a").is_err());
        assert!(find_group(&groups, "missing").is_err());
        assert!(find_group(&groups, "  ").is_err());
    }

    #[test]
    fn test_default_group_is_protected() {
        let mut store = Store::in_memory();
        let output = Output::new(OutputFormat::Quiet);

        assert!(delete(&mut store, "default".to_string(), &output).is_err());
        assert!(rename(&mut store, "Default".to_string(), "Inbox".to_string(), &output).is_err());
    }

    #[test]
    fn test_delete_moves_bookmarks() {
        let mut store = Store::in_memory();
        let output = Output::new(OutputFormat::Quiet);
        let group = store.add_group("Work").unwrap();
        let bookmark = store
            .add_bookmark(NewBookmark::new("Spec", "https://spec.example").in_group(&group.id))
            .unwrap();

        delete(&mut store, "work".to_string(), &output).unwrap();

        let moved = store.get_bookmark(&bookmark.id).unwrap().unwrap();
        assert_eq!(moved.group_id, "default");
        assert_eq!(store.get_groups().unwrap().len(), 1);
    }
}
