//! Export and import command handlers

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use later_core::import_export::DirectorySink;
use later_core::{Config, ExportFormat, ImportMode, Store};

use super::confirm;
use crate::output::Output;

/// Write an export file into `dir` (or the configured export directory)
pub fn export(
    store: &mut Store,
    config: &Config,
    format: ExportFormat,
    dir: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| config.export_dir());
    let mut sink = DirectorySink::new(&dir);

    let path = store
        .export_to(&mut sink, format)
        .with_context(|| format!("Failed to export to {:?}", dir))?;

    if output.is_quiet() {
        println!("{}", path.display());
    } else {
        output.success(&format!("Exported to {}", path.display()));
    }
    Ok(())
}

/// Import a JSON or CSV file
///
/// Merge keeps existing entities. Replace discards the current bookmarks
/// and groups and asks first when running interactively.
pub fn import(
    store: &mut Store,
    file: PathBuf,
    format: Option<ExportFormat>,
    merge: bool,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let format = format
        .or_else(|| ExportFormat::from_path(&file))
        .ok_or_else(|| anyhow!("Cannot tell the format of {:?}. Use --format json|csv.", file))?;

    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read import file: {:?}", file))?;

    let report = store.prepare_import(&content, format)?;
    let Some(data) = report.data else {
        bail!("{}", report.message);
    };

    let mode = if merge {
        ImportMode::Merge
    } else {
        ImportMode::Replace
    };

    if mode == ImportMode::Replace && !yes && output.should_prompt() {
        println!(
            "Replace all bookmarks and groups with {} bookmark(s) and {} group(s) from {}?",
            data.bookmarks.len(),
            data.groups.len(),
            file.display()
        );
        if !confirm("This cannot be undone. Continue?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let summary = store
        .apply_import(data, mode)
        .context("Failed to apply import")?;

    output.print_import_summary(&summary);
    Ok(())
}
