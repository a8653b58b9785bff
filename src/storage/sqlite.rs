//! SQLite storage implementation
//!
//! Stores every item's content with the time it was stored.

use crate::handler::Item;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const SQLITE_STORAGE_NAME: &str = "SQLite";

/// SQLite item storage
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        tracing::debug!("Opened SQLite storage at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of items stored so far
    pub fn count(&self) -> StorageResult<u64> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// All stored item contents in insertion order
    pub fn contents(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare("SELECT content FROM items ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        let contents = rows.collect::<Result<Vec<String>, _>>()?;
        Ok(contents)
    }
}

impl Storage for SqliteStorage {
    fn name(&self) -> &str {
        SQLITE_STORAGE_NAME
    }

    fn put(&self, item: &dyn Item) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO items (content, stored_at) VALUES (?1, ?2)",
            params![item.content(), now],
        )?;
        Ok(())
    }
}
