//! Engine configuration.

use std::path::PathBuf;

use docgraph_store::{StorageConfig, DEFAULT_DATABASE};

/// Default data directory of the embedded store.
pub const DEFAULT_DATA_PATH: &str = "./docgraph_data";

/// Default page cache capacity of the embedded store (64 MB).
pub const DEFAULT_CACHE_CAPACITY: u64 = 64 * 1024 * 1024;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Database namespace collections are created in.
    pub database: String,

    /// Data directory of the embedded store opened by [`Engine::open`](crate::Engine::open).
    /// `None` opens a temporary store.
    pub data_path: Option<PathBuf>,

    /// Start with schema provisioning disabled.
    pub frozen: bool,

    /// Page cache capacity of the embedded store in bytes.
    pub cache_capacity: u64,

    /// Flush interval of the embedded store in milliseconds.
    pub flush_every_ms: Option<u64>,
}

impl EngineConfig {
    /// Create a configuration for the given database namespace.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            data_path: Some(PathBuf::from(DEFAULT_DATA_PATH)),
            frozen: false,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            flush_every_ms: Some(500),
        }
    }

    /// Create a configuration backed by a temporary store.
    pub fn temporary(database: impl Into<String>) -> Self {
        Self {
            data_path: None,
            ..Self::new(database)
        }
    }

    /// Set the data directory.
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Start frozen: no collection or index is ever created.
    pub fn with_frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Set the page cache capacity.
    pub fn with_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Set the flush interval.
    pub fn with_flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }

    /// Storage configuration for the embedded store.
    pub fn storage(&self) -> StorageConfig {
        let storage = match &self.data_path {
            Some(path) => StorageConfig::new(path.clone()),
            None => StorageConfig::temporary(),
        };
        storage
            .with_database(self.database.clone())
            .with_cache_capacity(self.cache_capacity)
            .with_flush_every_ms(self.flush_every_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE)
    }
}
