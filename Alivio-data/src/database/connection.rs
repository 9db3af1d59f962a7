//! Store configuration and construction
//!
//! The journal is backed by one of two key-value stores:
//! - SQLite file (default)
//! - in-memory map (tests, ephemeral sessions)

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
#[cfg(feature = "sqlite")]
use std::time::Duration;
use tracing::info;
#[cfg(feature = "sqlite")]
use tracing::warn;

use super::in_memory::InMemoryStore;
#[cfg(feature = "sqlite")]
use super::sqlite::SqliteStore;
use super::{KeyValueStore, StorageError};

/// Default location of the SQLite journal file
pub const DEFAULT_SQLITE_PATH: &str = "./data/alivio.db";

/// Supported store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// SQLite database file
    #[cfg(feature = "sqlite")]
    Sqlite,
    /// Process-local map, lost on exit
    Memory,
}

impl StoreBackend {
    /// Convert from string to backend
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        match s.trim().to_lowercase().as_str() {
            #[cfg(feature = "sqlite")]
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            _ => Err(StorageError::UnsupportedBackend(s.to_string())),
        }
    }
}

impl Default for StoreBackend {
    fn default() -> Self {
        #[cfg(feature = "sqlite")]
        {
            StoreBackend::Sqlite
        }
        #[cfg(not(feature = "sqlite"))]
        {
            StoreBackend::Memory
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Backend to open
    pub backend: StoreBackend,
    /// Path to the SQLite file
    pub sqlite_path: PathBuf,
    /// Connection pool size
    pub pool_size: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
    /// Byte quota for the in-memory backend
    pub quota_bytes: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: PathBuf::from(DEFAULT_SQLITE_PATH),
            pool_size: 4,
            timeout_seconds: 30,
            quota_bytes: None,
        }
    }
}

impl StoreConfig {
    /// Create a store configuration from environment variables
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create a store configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let backend = match lookup("ALIVIO_STORE") {
            Some(value) => StoreBackend::parse(&value)?,
            None => defaults.backend,
        };

        let sqlite_path = lookup("ALIVIO_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.sqlite_path);

        let pool_size = parse_var(&lookup, "ALIVIO_POOL_SIZE")?.unwrap_or(defaults.pool_size);
        let timeout_seconds = parse_var(&lookup, "ALIVIO_TIMEOUT_SECONDS")?.unwrap_or(defaults.timeout_seconds);
        let quota_bytes = parse_var(&lookup, "ALIVIO_QUOTA_BYTES")?;

        info!(
            "Store configuration: backend={:?}, pool_size={}, timeout={}s",
            backend, pool_size, timeout_seconds
        );

        Ok(StoreConfig {
            backend,
            sqlite_path,
            pool_size,
            timeout_seconds,
            quota_bytes,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, StorageError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| StorageError::Config(format!("{} has an invalid value: {}", name, raw))),
        None => Ok(None),
    }
}

/// Open the store described by `config`.
///
/// When the SQLite file cannot be opened the journal falls back to an
/// in-memory SQLite database so the session stays usable. Callers can detect
/// this through [`KeyValueStore::is_persistent`].
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match config.backend {
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => {
            let timeout = Duration::from_secs(config.timeout_seconds);
            match SqliteStore::open_file(&config.sqlite_path, config.pool_size, timeout) {
                Ok(store) => {
                    info!("{}", store.connection_info());
                    Ok(Arc::new(store))
                }
                Err(e) => {
                    warn!("Failed to open SQLite store: {}, falling back to in-memory database", e);
                    Ok(Arc::new(SqliteStore::open_in_memory(timeout)?))
                }
            }
        }
        StoreBackend::Memory => {
            info!("Using in-memory store");
            let store = match config.quota_bytes {
                Some(quota) => InMemoryStore::with_quota(quota),
                None => InMemoryStore::new(),
            };
            Ok(Arc::new(store))
        }
    }
}
