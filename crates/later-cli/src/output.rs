//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::{DateTime, Local};
use serde::Serialize;

use later_core::models::{Backup, Bookmark, Group, SearchHistory};
use later_core::projection::group_name;
use later_core::search::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN};
use later_core::ImportSummary;

const ANSI_HIGHLIGHT: &str = "\x1b[1;33m";
const ANSI_RESET: &str = "\x1b[0m";

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// A bookmark row of search results with highlighted fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit<'a> {
    #[serde(flatten)]
    pub bookmark: &'a Bookmark,
    /// HTML with `<mark>` around literal query matches
    pub highlighted_title: String,
    pub highlighted_url: String,
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single bookmark
    pub fn print_bookmark(&self, bookmark: &Bookmark, groups: &[Group]) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", bookmark.id);
                println!("Title:   {}", bookmark.title);
                println!("URL:     {}", bookmark.url);
                println!("Group:   {}", group_name(groups, &bookmark.group_id));
                if !bookmark.tags.is_empty() {
                    println!("Tags:    {}", bookmark.tags.join(", "));
                }
                println!("Status:  {}", read_label(bookmark.is_read));
                println!("Created: {}", format_timestamp(bookmark.created_at));
                if let Some(updated_at) = bookmark.updated_at {
                    println!("Updated: {}", format_timestamp(updated_at));
                }
                if let Some(notes) = bookmark.notes.as_deref().filter(|n| !n.is_empty()) {
                    println!();
                    println!("── Notes ──");
                    println!("{}", notes);
                }
            }
            OutputFormat::Json => print_json(bookmark),
            OutputFormat::Quiet => {
                println!("{}", bookmark.id);
            }
        }
    }

    /// Print a list of bookmarks
    pub fn print_bookmarks(&self, bookmarks: &[&Bookmark], groups: &[Group]) {
        match self.format {
            OutputFormat::Human => {
                if bookmarks.is_empty() {
                    println!("No bookmarks found.");
                    return;
                }
                for bookmark in bookmarks {
                    println!(
                        "{} {} | {} | {} | {}",
                        if bookmark.is_read { " " } else { "*" },
                        short_id(&bookmark.id),
                        truncate(&bookmark.title, 35),
                        truncate(group_name(groups, &bookmark.group_id), 12),
                        truncate(&bookmark.url, 40)
                    );
                }
                println!("\n{} bookmark(s)", bookmarks.len());
            }
            OutputFormat::Json => print_json(&bookmarks),
            OutputFormat::Quiet => {
                for bookmark in bookmarks {
                    println!("{}", bookmark.id);
                }
            }
        }
    }

    /// Print search results with the literal query occurrences highlighted
    pub fn print_search_hits(&self, hits: &[SearchHit<'_>]) {
        match self.format {
            OutputFormat::Human => {
                if hits.is_empty() {
                    println!("No bookmarks found.");
                    return;
                }
                for hit in hits {
                    println!(
                        "{} | {}",
                        short_id(&hit.bookmark.id),
                        to_terminal(&hit.highlighted_title)
                    );
                    println!("         {}", to_terminal(&hit.highlighted_url));
                }
                println!("\n{} match(es)", hits.len());
            }
            OutputFormat::Json => print_json(&hits),
            OutputFormat::Quiet => {
                for hit in hits {
                    println!("{}", hit.bookmark.id);
                }
            }
        }
    }

    /// Print groups with the number of bookmarks in each
    pub fn print_groups(&self, groups: &[(Group, usize)]) {
        match self.format {
            OutputFormat::Human => {
                for (group, count) in groups {
                    let marker = if group.is_default() { " (default)" } else { "" };
                    println!(
                        "{} | {}{} ({})",
                        short_id(&group.id),
                        group.name,
                        marker,
                        count
                    );
                }
                println!("\n{} group(s)", groups.len());
            }
            OutputFormat::Json => {
                let json_groups: Vec<_> = groups
                    .iter()
                    .map(|(group, count)| {
                        serde_json::json!({
                            "id": group.id,
                            "name": group.name,
                            "order": group.order,
                            "count": count
                        })
                    })
                    .collect();
                print_json(&json_groups);
            }
            OutputFormat::Quiet => {
                for (group, _) in groups {
                    println!("{}", group.id);
                }
            }
        }
    }

    /// Print a list of tags
    pub fn print_tags(&self, tags: &[(String, usize)]) {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return;
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                print_json(&json_tags);
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
    }

    pub fn print_history(&self, history: &[SearchHistory]) {
        match self.format {
            OutputFormat::Human => {
                if history.is_empty() {
                    println!("No recent searches.");
                    return;
                }
                for entry in history {
                    println!("{}  {}", format_timestamp(entry.timestamp), entry.query);
                }
            }
            OutputFormat::Json => print_json(&history),
            OutputFormat::Quiet => {
                for entry in history {
                    println!("{}", entry.query);
                }
            }
        }
    }

    /// Print backups without their snapshot data
    pub fn print_backups(&self, backups: &[Backup]) {
        match self.format {
            OutputFormat::Human => {
                if backups.is_empty() {
                    println!("No backups.");
                    return;
                }
                for backup in backups {
                    println!(
                        "{} | {} | {} bookmark(s) | {} bytes",
                        short_id(&backup.id),
                        format_timestamp(backup.timestamp),
                        backup.data.bookmarks.len(),
                        backup.size
                    );
                }
                println!("\n{} backup(s)", backups.len());
            }
            OutputFormat::Json => {
                let json_backups: Vec<_> = backups
                    .iter()
                    .map(|backup| {
                        serde_json::json!({
                            "id": backup.id,
                            "timestamp": backup.timestamp,
                            "bookmarks": backup.data.bookmarks.len(),
                            "groups": backup.data.groups.len(),
                            "size": backup.size
                        })
                    })
                    .collect();
                print_json(&json_backups);
            }
            OutputFormat::Quiet => {
                for backup in backups {
                    println!("{}", backup.id);
                }
            }
        }
    }

    pub fn print_import_summary(&self, summary: &ImportSummary) {
        match self.format {
            OutputFormat::Human => {
                println!("✓ Import successful");
                println!(
                    "  bookmarks: {} added, {} skipped",
                    summary.bookmarks_added, summary.bookmarks_skipped
                );
                println!(
                    "  groups:    {} added, {} skipped",
                    summary.groups_added, summary.groups_skipped
                );
                if summary.reassigned > 0 {
                    println!("  {} bookmark(s) moved to the default group", summary.reassigned);
                }
            }
            OutputFormat::Json => print_json(summary),
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn read_label(is_read: bool) -> &'static str {
    if is_read {
        "read"
    } else {
        "unread"
    }
}

/// First 8 characters of an id
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Epoch milliseconds as local `YYYY-MM-DD HH:MM`
pub fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Turn highlighted HTML into terminal text
///
/// Marks become bold yellow and the escaped entities are restored.
fn to_terminal(html: &str) -> String {
    html.replace(HIGHLIGHT_OPEN, ANSI_HIGHLIGHT)
        .replace(HIGHLIGHT_CLOSE, ANSI_RESET)
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
