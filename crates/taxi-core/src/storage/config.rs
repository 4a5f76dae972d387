//! Storage configuration.

use std::path::PathBuf;

use crate::password::DEFAULT_ITERATIONS;

/// Configuration for opening a [`FleetStore`](super::FleetStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the database directory.
    pub path: PathBuf,

    /// Cache capacity in bytes.
    pub cache_capacity: u64,

    /// Flush interval in milliseconds. None disables periodic flushing.
    pub flush_every_ms: Option<u64>,

    /// Enable zstd compression of pages.
    pub compression: bool,

    /// Temporary database (deleted on drop).
    pub temporary: bool,

    /// PBKDF2 rounds used when hashing new passwords.
    pub password_iterations: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./taxi_data"),
            cache_capacity: 64 * 1024 * 1024, // 64MB
            flush_every_ms: Some(1000),
            compression: false,
            temporary: false,
            password_iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a temporary configuration, removed when the store is dropped.
    pub fn temporary() -> Self {
        Self {
            path: PathBuf::from(""),
            temporary: true,
            ..Default::default()
        }
    }

    /// Set the PBKDF2 round count for new password hashes.
    pub fn with_password_iterations(mut self, iterations: u32) -> Self {
        self.password_iterations = iterations.max(1);
        self
    }

    /// Enable or disable page compression.
    pub fn with_compression(mut self, compression: bool) -> Self {
        self.compression = compression;
        self
    }

    /// Convert to sled configuration.
    pub(crate) fn to_sled_config(&self) -> sled::Config {
        let mut config = sled::Config::new()
            .cache_capacity(self.cache_capacity)
            .use_compression(self.compression);

        if self.temporary {
            config = config.temporary(true);
        } else {
            config = config.path(&self.path);
        }

        if let Some(ms) = self.flush_every_ms {
            config = config.flush_every_ms(Some(ms));
        }

        config
    }
}
