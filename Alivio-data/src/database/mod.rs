use std::sync::PoisonError;
use thiserror::Error;

// Storage backends and their configuration
pub mod connection;
pub mod in_memory;
#[cfg(feature = "sqlite")]
pub mod migrations;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use connection::{open_store, StoreBackend, StoreConfig};
pub use in_memory::InMemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Durable, synchronous, string-keyed text storage scoped to one device.
///
/// Implementations are single-writer: the repositories built on top of a
/// store assume nothing else writes the same keys while they hold a cache.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key
    fn clear(&self) -> Result<(), StorageError>;

    /// Whether values outlive the process
    fn is_persistent(&self) -> bool {
        true
    }
}

/// Storage error enum
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing the value would exceed the store's quota
    #[error("Storage quota exceeded writing '{key}': {required} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        required: usize,
        quota: usize,
    },

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),

    /// Migration error
    #[error("Storage migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Storage configuration error: {0}")]
    Config(String),

    /// Unsupported backend
    #[error("Unsupported storage backend: {0}")]
    UnsupportedBackend(String),
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(error: PoisonError<T>) -> Self {
        StorageError::Lock(error.to_string())
    }
}
