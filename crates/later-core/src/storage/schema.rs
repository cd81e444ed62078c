//! SQLite schema for the live key-value store
//!
//! The live backend mirrors a browser extension's local storage area: one
//! flat namespace of keys, each holding a JSON value. The schema version is
//! kept in SQLite's `user_version` pragma.

use rusqlite::{Connection, Result};

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Create the storage table and stamp the schema version
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
}

/// Schema version stamped in the database, 0 for a fresh file
pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// True when the database predates the current schema
pub fn needs_init(conn: &Connection) -> bool {
    schema_version(conn).map_or(true, |version| version < SCHEMA_VERSION)
}
