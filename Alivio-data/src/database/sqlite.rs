use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OpenFlags, OptionalExtension};
use tracing::{debug, info};

use super::migrations::run_sqlite_migrations;
use super::{KeyValueStore, StorageError};

/// SQLite-backed key-value store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    /// Connection pool
    pool: Arc<r2d2::Pool<SqliteConnectionManager>>,

    /// File path, or `:memory:`
    location: String,
}

impl SqliteStore {
    /// Open (or create) a store backed by the SQLite file at `path`
    pub fn open_file(path: &Path, pool_size: u32, timeout: Duration) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                info!("Creating parent directory: {:?}", parent);
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Config(format!("Failed to create {:?}: {}", parent, e)))?;
            }
        }

        info!("Opening SQLite store at: {}", path.display());

        let manager = SqliteConnectionManager::file(path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);

        let pool = r2d2::Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(timeout)
            .build(manager)?;

        Self::initialize(pool, path.display().to_string())
    }

    /// Open a store backed by an in-memory SQLite database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// limited to a single connection.
    pub fn open_in_memory(timeout: Duration) -> Result<Self, StorageError> {
        info!("Opening in-memory SQLite store");

        let pool = r2d2::Pool::builder()
            .max_size(1)
            .connection_timeout(timeout)
            .build(SqliteConnectionManager::memory())?;

        Self::initialize(pool, ":memory:".to_string())
    }

    fn initialize(pool: r2d2::Pool<SqliteConnectionManager>, location: String) -> Result<Self, StorageError> {
        let conn = pool.get()?;
        run_sqlite_migrations(&conn).map_err(StorageError::Migration)?;

        Ok(Self {
            pool: Arc::new(pool),
            location,
        })
    }

    /// Human readable description of the connection
    pub fn connection_info(&self) -> String {
        let state = self.pool.state();
        let target = if self.location == ":memory:" {
            "SQLite in-memory store".to_string()
        } else {
            format!("SQLite store at {}", self.location)
        };

        format!("{} (connections: active={}, idle={})", target, state.connections, state.idle_connections)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        debug!("Reading key from SQLite store: {}", key);

        let conn = self.pool.get()?;
        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!("Writing key to SQLite store: {} ({} bytes)", key, value.len());

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, Utc::now().to_rfc3339()),
        )?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        debug!("Removing key from SQLite store: {}", key);

        let conn = self.pool.get()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;

        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        debug!("Clearing SQLite store");

        let conn = self.pool.get()?;
        conn.execute("DELETE FROM kv_store", [])?;

        Ok(())
    }

    fn is_persistent(&self) -> bool {
        self.location != ":memory:"
    }
}
