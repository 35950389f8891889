//! Configuration for feedcache
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a cache instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the single-file archive container holding all records.
    /// Internal structure:
    ///   {archive_path} (tar)
    ///     ├── current_state.json            (bookmark)
    ///     └── {shard}/{bucket}/{id}.json    (entry records)
    pub archive_path: PathBuf,

    // -------------------------------------------------------------------------
    // Traversal Configuration
    // -------------------------------------------------------------------------
    /// Optional upper bound on how many records a single chain traversal
    /// may visit before it is reported as broken.
    ///
    /// `None` (the default) walks the persisted chain exactly as stored:
    /// a malformed chain may then terminate early or never terminate.
    /// `Some(n)` converts a walk of more than `n` records into
    /// `CacheError::BrokenChain`.
    pub traversal_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive_path: PathBuf::from("./feedcache_data/entries.tar"),
            traversal_limit: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the archive container path
    pub fn archive_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.archive_path = path.into();
        self
    }

    /// Set the traversal safety bound (maximum records per chain walk)
    pub fn traversal_limit(mut self, limit: usize) -> Self {
        self.config.traversal_limit = Some(limit);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
