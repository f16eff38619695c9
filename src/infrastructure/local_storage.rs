//! Local `SQLite` key-value storage.
//!
//! Persists string slots in a single `ItemTable` so todos survive
//! between runs of the CLI.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::key_value::KeyValueStorage;
use crate::domain::{AppError, Result};

/// Key-value storage backed by a `SQLite` file.
pub struct LocalStorage {
    conn: Mutex<Connection>,
}

impl LocalStorage {
    /// Opens or creates the storage database.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or schema creation fails.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create storage directory", e))?;
        }

        let conn = Connection::open(path).map_err(AppError::database)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(AppError::database)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ItemTable (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .map_err(AppError::database)?;

        tracing::debug!("Local storage ready");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::storage("storage connection lock poisoned"))
    }

    /// Number of stored slots.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn slot_count(&self) -> Result<usize> {
        self.conn()?
            .query_row("SELECT COUNT(*) FROM ItemTable", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|c| usize::try_from(c).unwrap_or_default())
            .map_err(AppError::database)
    }
}

impl KeyValueStorage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.conn()?
            .query_row(
                "SELECT value FROM ItemTable WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(AppError::database)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO ItemTable (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(AppError::database)?;

        tracing::trace!(key, bytes = value.len(), "Wrote storage slot");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let removed = self
            .conn()?
            .execute("DELETE FROM ItemTable WHERE key = ?1", [key])
            .map_err(AppError::database)?;

        tracing::trace!(key, removed, "Removed storage slot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("test.db");

        let storage = LocalStorage::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(storage.slot_count().unwrap(), 0);
    }

    #[test]
    fn test_slots_survive_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        {
            let storage = LocalStorage::open(&db_path).unwrap();
            storage.set_item("tasks", "[]").unwrap();
            storage.set_item("tasks", "[1]").unwrap();
        }

        let storage = LocalStorage::open(&db_path).unwrap();
        assert_eq!(storage.get_item("tasks").unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.slot_count().unwrap(), 1);
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::open(&dir.path().join("test.db")).unwrap();

        assert_eq!(storage.get_item("missing").unwrap(), None);
    }

    #[test]
    fn test_remove_item_persists() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        {
            let storage = LocalStorage::open(&db_path).unwrap();
            storage.set_item("tasks", "[1]").unwrap();
            storage.set_item("keep", "yes").unwrap();
            storage.remove_item("tasks").unwrap();
            storage.remove_item("tasks").unwrap();
        }

        let storage = LocalStorage::open(&db_path).unwrap();
        assert_eq!(storage.get_item("tasks").unwrap(), None);
        assert_eq!(storage.get_item("keep").unwrap().as_deref(), Some("yes"));
        assert_eq!(storage.slot_count().unwrap(), 1);
    }
}
