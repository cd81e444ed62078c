//! Later CLI
//!
//! Command-line interface for Later - save links now, read them later.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use later_core::sort::{ReadStatusFilter, SortOptions, SortOrder, SortType};
use later_core::{Config, ExportFormat, StorageError, Store};

mod commands;
mod output;

use commands::bookmark::ListFilter;
use output::{Output, OutputFormat};

/// Log level when LATER_LOG is unset
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "later")]
#[command(about = "Later - save links now, read them later")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a bookmark
    Add {
        /// URL to save
        url: String,
        /// Title (defaults to the URL)
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Group name or ID
        #[arg(short, long)]
        group: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List bookmarks
    #[command(alias = "ls")]
    List {
        /// Only bookmarks in this group (name or ID)
        #[arg(short, long)]
        group: Option<String>,
        /// Only bookmarks with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// all, read or unread
        #[arg(short, long, default_value = "all")]
        status: ReadStatusFilter,
        /// Fuzzy filter on title, URL and tags
        #[arg(long)]
        search: Option<String>,
        /// created, updated, title or order
        #[arg(long, default_value = "created")]
        sort: SortType,
        /// asc or desc
        #[arg(long, default_value = "desc")]
        order: SortOrder,
    },
    /// Show bookmark details
    Show {
        /// Bookmark ID (full or prefix)
        id: String,
    },
    /// Update a bookmark
    Update {
        /// Bookmark ID (full or prefix)
        id: String,
        #[arg(short = 'T', long)]
        title: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Move to this group (name or ID)
        #[arg(short, long)]
        group: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Manual sort position
        #[arg(long)]
        order: Option<i64>,
    },
    /// Delete a bookmark
    #[command(alias = "delete")]
    Rm {
        /// Bookmark ID (full or prefix)
        id: String,
    },
    /// Mark bookmarks as read
    Read {
        /// Bookmark IDs (full or prefix)
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Mark bookmarks as unread
    Unread {
        /// Bookmark IDs (full or prefix)
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Manage groups
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
    /// Export all data to a file
    Export {
        /// json or csv
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
        /// Directory to write into (defaults to export_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Import a JSON or CSV export
    Import {
        /// File to import
        file: PathBuf,
        /// json or csv (guessed from the extension by default)
        #[arg(short, long)]
        format: Option<ExportFormat>,
        /// Keep existing data and add new entries
        #[arg(short, long)]
        merge: bool,
        /// Replace without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Fuzzy-search bookmarks
    Search {
        /// Search query
        query: String,
    },
    /// Show recent searches
    History {
        /// Forget all recent searches
        #[arg(long)]
        clear: bool,
    },
    /// Show or change the theme (light, dark or toggle)
    Theme {
        mode: Option<String>,
    },
    /// Manage backups
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// Add tags to a bookmark
    Add {
        /// Bookmark ID (full or prefix)
        id: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Remove tags from a bookmark
    #[command(alias = "remove")]
    Rm {
        /// Bookmark ID (full or prefix)
        id: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Replace a bookmark's tags (comma-separated, empty clears)
    Set {
        /// Bookmark ID (full or prefix)
        id: String,
        tags: String,
    },
    /// List all tags
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
enum GroupCommands {
    /// List groups
    #[command(alias = "ls")]
    List,
    /// Create a group
    #[command(alias = "add")]
    Create { name: String },
    /// Rename a group
    Rename {
        /// Group name or ID
        group: String,
        name: String,
    },
    /// Delete a group (its bookmarks move to the default group)
    #[command(alias = "rm")]
    Delete {
        /// Group name or ID
        group: String,
    },
}

#[derive(Subcommand)]
enum BackupCommands {
    /// Snapshot bookmarks and groups
    Create,
    /// List backups
    #[command(alias = "ls")]
    List,
    /// Restore a backup
    Restore {
        /// Backup ID (full or prefix)
        id: String,
    },
    /// Delete a backup
    #[command(alias = "rm")]
    Delete {
        /// Backup ID (full or prefix)
        id: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backend, export_dir, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(hint) = recovery_hint(&err) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Recovery suggestion of the first storage error in the chain
fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StorageError>())
        .and_then(StorageError::recovery_suggestion)
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands work even when the store cannot be opened
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    let mut store = Store::open_with_config(&config).context("Failed to open storage")?;
    debug!("Using {} backend in {:?}", store.backend_name(), config.data_dir);

    match cli.command {
        Commands::Add {
            url,
            title,
            group,
            tag,
            notes,
        } => commands::bookmark::add(&mut store, url, title, group, tag, notes, &output),
        Commands::List {
            group,
            tag,
            status,
            search,
            sort,
            order,
        } => {
            let filter = ListFilter {
                group,
                tag,
                status,
                search,
                sort: SortOptions::new(sort, order),
            };
            commands::bookmark::list(&mut store, filter, &output)
        }
        Commands::Show { id } => commands::bookmark::show(&mut store, id, &output),
        Commands::Update {
            id,
            title,
            url,
            group,
            notes,
            order,
        } => commands::bookmark::update(&mut store, id, title, url, group, notes, order, &output),
        Commands::Rm { id } => commands::bookmark::remove(&mut store, id, &output),
        Commands::Read { ids } => commands::bookmark::set_read(&mut store, ids, true, &output),
        Commands::Unread { ids } => commands::bookmark::set_read(&mut store, ids, false, &output),
        Commands::Tag { command } => handle_tag_command(command, &mut store, &output),
        Commands::Group { command } => handle_group_command(command, &mut store, &output),
        Commands::Export { format, dir } => {
            commands::transfer::export(&mut store, &config, format, dir, &output)
        }
        Commands::Import {
            file,
            format,
            merge,
            yes,
        } => commands::transfer::import(&mut store, file, format, merge, yes, &output),
        Commands::Search { query } => commands::search::search(&mut store, query, &output),
        Commands::History { clear } => commands::search::history(&mut store, clear, &output),
        Commands::Theme { mode } => commands::settings::theme(&mut store, mode, &output),
        Commands::Backup { command } => handle_backup_command(command, &mut store, &output),
        Commands::Config { command } => handle_config_command(command, &output),
    }
}

fn handle_tag_command(command: TagCommands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        TagCommands::Add { id, tags } => commands::tag::add(store, id, tags, output),
        TagCommands::Rm { id, tags } => commands::tag::remove(store, id, tags, output),
        TagCommands::Set { id, tags } => commands::tag::set(store, id, tags, output),
        TagCommands::List => commands::tag::list(store, output),
    }
}

fn handle_group_command(command: GroupCommands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        GroupCommands::List => commands::group::list(store, output),
        GroupCommands::Create { name } => commands::group::create(store, name, output),
        GroupCommands::Rename { group, name } => commands::group::rename(store, group, name, output),
        GroupCommands::Delete { group } => commands::group::delete(store, group, output),
    }
}

fn handle_backup_command(command: BackupCommands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        BackupCommands::Create => commands::backup::create(store, output),
        BackupCommands::List => commands::backup::list(store, output),
        BackupCommands::Restore { id } => commands::backup::restore(store, id, output),
        BackupCommands::Delete { id } => commands::backup::delete(store, id, output),
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Initialize logging
///
/// The level comes from LATER_LOG (default "warn"). Logs go to the
/// configured log file, or stderr when none is set.
fn init_logging(config: &Config) {
    let level = std::env::var("LATER_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let env_filter = EnvFilter::new(format!("later_core={},later_cli={}", level, level));

    let Some(ref log_path) = config.log_file else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    // Initialize file-based logging (ignore error if already initialized)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_recovery_hint_found_through_context() {
        let err = anyhow::Error::new(StorageError::DiskFull {
            path: PathBuf::from("/data/storage.db"),
            source: io::Error::new(io::ErrorKind::Other, "No space left on device"),
        })
        .context("Failed to add bookmark");

        assert_eq!(recovery_hint(&err), Some("Free up disk space and try again."));
    }

    #[test]
    fn test_no_recovery_hint_for_other_errors() {
        let err = anyhow::anyhow!("Bookmark ID must not be empty");
        assert!(recovery_hint(&err).is_none());

        let err = anyhow::Error::new(StorageError::invalid("title must not be empty"));
        assert!(recovery_hint(&err).is_none());
    }
}
