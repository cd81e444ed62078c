//! Backup command handlers

use anyhow::{bail, Context, Result};

use later_core::models::Backup;
use later_core::Store;

use super::confirm;
use crate::output::Output;

pub fn create(store: &mut Store, output: &Output) -> Result<()> {
    let backup = store.create_backup().context("Failed to create backup")?;

    if output.is_quiet() {
        println!("{}", backup.id);
    } else {
        output.success(&format!(
            "Created backup {} ({} bookmark(s))",
            backup.id,
            backup.data.bookmarks.len()
        ));
    }
    Ok(())
}

pub fn list(store: &mut Store, output: &Output) -> Result<()> {
    output.print_backups(&store.backups()?);
    Ok(())
}

/// Replace bookmarks and groups with a backup
pub fn restore(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let backups = store.backups()?;
    let backup = find_backup(&backups, &id)?;

    if output.should_prompt() {
        println!(
            "Restore backup {} with {} bookmark(s)? Current bookmarks and groups are replaced.",
            backup.id,
            backup.data.bookmarks.len()
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .restore_backup(&backup.id)
        .context("Failed to restore backup")?;

    output.success(&format!("Restored backup {}", backup.id));
    Ok(())
}

pub fn delete(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let backups = store.backups()?;
    let backup = find_backup(&backups, &id)?;

    store
        .delete_backup(&backup.id)
        .context("Failed to delete backup")?;

    output.success(&format!("Deleted backup {}", backup.id));
    Ok(())
}

/// Find a backup by full id or unique prefix
fn find_backup<'a>(backups: &'a [Backup], id: &str) -> Result<&'a Backup> {
    let matches: Vec<&Backup> = backups
        .iter()
        .filter(|b| !id.is_empty() && b.id.starts_with(id))
        .collect();

    match matches.as_slice() {
        [] => bail!("No backup found matching: {}", id),
        [backup] => Ok(*backup),
        _ => match matches.iter().find(|b| b.id == id) {
            Some(backup) => Ok(*backup),
            None => bail!("Ambiguous ID. Please provide more characters."),
        },
    }
}
