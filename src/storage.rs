// Durable key-value storage backends

use crate::todo::now_ms;
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_VERSION: u32 = 1;

/// Key holding the JSON-serialized todo collection
pub const TODOS_KEY: &str = "todos";

/// Key holding the dark-mode flag as "true" or "false"
pub const DARK_MODE_KEY: &str = "darkMode";

/// String-keyed persistent key-value store
///
/// Mirrors the browser local-storage surface: string keys, string values.
pub trait Storage {
    /// Read a key, `None` if it was never written
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a key, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a key; removing an absent key is not an error
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// Process-local storage that vanishes with the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &HashMap<String, String> {
        &self.items
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// SQLite-backed storage that survives across sessions
pub struct SqliteStorage {
    base_path: Option<PathBuf>,
    db: Connection,
}

impl SqliteStorage {
    /// Open or create storage at the given path
    ///
    /// The database lives in a `.todostore` subdirectory of the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().join(".todostore");

        fs::create_dir_all(&base_path).context("Failed to create storage directory")?;

        let db_path = base_path.join("local_storage.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let storage = Self {
            base_path: Some(base_path),
            db,
        };

        storage.create_schema()?;
        storage.create_gitignore()?;
        storage.write_version()?;

        info!(path = ?db_path, "Opened local storage");
        Ok(storage)
    }

    /// Open a transient database with the same schema
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let storage = Self { base_path: None, db };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Directory holding the database, `None` for in-memory storage
    pub fn base_path(&self) -> Option<&Path> {
        self.base_path.as_deref()
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.db.prepare("SELECT key FROM items ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating storage schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn create_gitignore(&self) -> Result<()> {
        let Some(base_path) = &self.base_path else {
            return Ok(());
        };
        let gitignore_path = base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(
                gitignore_path,
                "local_storage.db\nlocal_storage.db-shm\nlocal_storage.db-wal\n",
            )?;
        }
        Ok(())
    }

    fn write_version(&self) -> Result<()> {
        let Some(base_path) = &self.base_path else {
            return Ok(());
        };
        let version_path = base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.db
            .query_row("SELECT value FROM items WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read storage key {}", key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.db
            .execute(
                "INSERT OR REPLACE INTO items (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, now_ms()],
            )
            .with_context(|| format!("Failed to write storage key {}", key))?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.db
            .execute("DELETE FROM items WHERE key = ?1", [key])
            .with_context(|| format!("Failed to remove storage key {}", key))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage_roundtrip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_item(TODOS_KEY).unwrap(), None);

        storage.set_item(TODOS_KEY, "[]").unwrap();
        assert_eq!(storage.get_item(TODOS_KEY).unwrap().as_deref(), Some("[]"));

        storage.remove_item(TODOS_KEY).unwrap();
        assert!(storage.items().is_empty());
    }

    #[test]
    fn test_sqlite_open_creates_directory() {
        let temp = TempDir::new().unwrap();

        let storage = SqliteStorage::open(temp.path()).unwrap();
        let store_path = temp.path().join(".todostore");
        assert_eq!(storage.base_path(), Some(store_path.as_path()));
        assert!(store_path.join("local_storage.db").exists());
        assert!(store_path.join(".gitignore").exists());
        assert_eq!(fs::read_to_string(store_path.join(".version")).unwrap(), "1");
    }

    #[test]
    fn test_sqlite_set_overwrites() {
        let mut storage = SqliteStorage::in_memory().unwrap();

        storage.set_item(DARK_MODE_KEY, "false").unwrap();
        storage.set_item(DARK_MODE_KEY, "true").unwrap();

        assert_eq!(storage.get_item(DARK_MODE_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(storage.keys().unwrap(), vec![DARK_MODE_KEY.to_string()]);
    }

    #[test]
    fn test_sqlite_remove_missing_key() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.remove_item("nonexistent").unwrap();
        assert_eq!(storage.get_item("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let temp = TempDir::new().unwrap();

        {
            let mut storage = SqliteStorage::open(temp.path()).unwrap();
            storage.set_item(TODOS_KEY, r#"[{"id":1}]"#).unwrap();
            storage.set_item(DARK_MODE_KEY, "true").unwrap();
        }

        let storage = SqliteStorage::open(temp.path()).unwrap();
        assert_eq!(
            storage.get_item(TODOS_KEY).unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert_eq!(
            storage.keys().unwrap(),
            vec![DARK_MODE_KEY.to_string(), TODOS_KEY.to_string()]
        );
    }
}
