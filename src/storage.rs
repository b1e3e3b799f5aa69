use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::app_dirs::AppDirs;
use crate::error::PersistenceError;

/// Key/blob storage medium backing the session history
pub trait BlobStore {
    /// Returns `Ok(None)` when nothing has been stored under `key` yet.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// SQLite-backed blob storage
#[derive(Debug)]
pub struct SqliteBlobStore {
    conn: Connection,
}

impl SqliteBlobStore {
    /// Open the store at the default state-directory location
    pub fn new() -> Result<Self, PersistenceError> {
        let path = AppDirs::history_db_path().ok_or_else(|| {
            PersistenceError::Unavailable("no home or data directory found".to_string())
        })?;
        Self::open(path)
    }

    /// Open (or create) a store at `path`, creating parent directories
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }
}

impl BlobStore for SqliteBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-process storage. Clones share the same map, so a caller can keep a
/// handle and inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).write(key, value)
    }
}
