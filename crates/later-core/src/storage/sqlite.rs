//! Live key-value backend on SQLite
//!
//! Each document key is one row; the value column holds the key's JSON.
//! A commit writes all of its keys inside a single transaction, so a group
//! deletion and its bookmark reassignment land together.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection};
use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{now_millis, DocumentPatch};
use crate::storage::backend::StorageBackend;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema::{init_schema, needs_init};

/// Live storage area backed by a SQLite file
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        debug!("Opened live storage at {:?}", path);
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Number of keys currently stored
    pub fn key_count(&self) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM storage", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl StorageBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn load(&mut self) -> StorageResult<DocumentPatch> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM storage")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut stored = Map::new();
        for row in rows {
            let (key, value) = row?;
            stored.insert(key, serde_json::from_str(&value)?);
        }

        debug!("Read {} key(s) from live storage", stored.len());
        Ok(serde_json::from_value(Value::Object(stored))?)
    }

    fn commit(&mut self, patch: &DocumentPatch) -> StorageResult<()> {
        let values = match serde_json::to_value(patch)? {
            Value::Object(map) => map,
            _ => return Ok(()),
        };

        let now = now_millis();
        let tx = self.conn.transaction()?;
        for (key, value) in &values {
            tx.execute(
                "INSERT OR REPLACE INTO storage (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value.to_string(), now],
            )?;
        }
        tx.commit()?;

        debug!("Committed {:?} to live storage", patch.keys());
        Ok(())
    }
}
