//! Read-through configuration cache with mtime-based invalidation.
//!
//! A cached [`ProjectConfig`] is reused only while the source's current
//! version (its modification time) equals the version stored with it.
//! This is not content hashing: two different contents written within the
//! same second are indistinguishable, and the stale one may be served until
//! the timestamp moves. In exchange no file is read on a cache hit.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use xunsearch_core::config::{CachedConfigLoader, FileSource, MemoryCacheStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::tempdir()?;
//! # let path = dir.path().join("demo.ini");
//! # std::fs::write(&path, "[pid]\ntype = id\n")?;
//! let loader = CachedConfigLoader::new(Arc::new(MemoryCacheStore::new()));
//! let config = loader.load(&FileSource::new(&path))?;
//! assert!(config.section("pid").is_some());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use crate::config::cache::{CacheEntry, CacheStore, DEFAULT_CACHE_TTL};
use crate::config::parser::ProjectConfig;
use crate::error::{Error, Result};

/// Prefix of every cache key written by the loader.
pub const CACHE_KEY_PREFIX: &str = "xunsearch_";

/// Where configuration text comes from.
pub trait ConfigSource {
    /// Stable identity of the source, used to derive the cache key.
    fn id(&self) -> &str;

    /// Current version of the source; a change forces a re-parse.
    fn version(&self) -> Result<u64>;

    /// Read the full configuration text.
    fn read(&self) -> Result<String>;
}

/// An ini file on disk, versioned by its modification time in seconds.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    id: String,
}

impl FileSource {
    /// Create a source for the given path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let id = path.to_string_lossy().into_owned();
        Self { path, id }
    }

    /// The file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> Result<u64> {
        let meta = std::fs::metadata(&self.path).map_err(|e| Error::config_io(&self.id, e))?;
        let modified = meta.modified().map_err(|e| Error::config_io(&self.id, e))?;
        let since_epoch = modified.duration_since(UNIX_EPOCH).map_err(|e| {
            Error::config_load(&self.id, format!("modification time before epoch: {e}"))
        })?;
        Ok(since_epoch.as_secs())
    }

    fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| Error::config_io(&self.id, e))
    }
}

/// Derive the cache key for a source identity.
pub fn cache_key(source_id: &str) -> String {
    format!(
        "{CACHE_KEY_PREFIX}{}",
        blake3::hash(source_id.as_bytes()).to_hex()
    )
}

/// Loads project configuration through a [`CacheStore`].
#[derive(Clone)]
pub struct CachedConfigLoader {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl std::fmt::Debug for CachedConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedConfigLoader")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CachedConfigLoader {
    /// Create a loader with the default one-day TTL.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override how long written entries live in the store.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The TTL applied to written entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the configuration for `source`, parsing only when the cached
    /// entry is missing, corrupt, or built from another source version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigLoad`] when the source cannot be read or
    /// parses to an empty configuration.
    pub fn load(&self, source: &dyn ConfigSource) -> Result<Arc<ProjectConfig>> {
        let key = cache_key(source.id());
        let version = source.version()?;

        if let Some(entry) = self.lookup(&key, source.id()) {
            if entry.is_fresh(version) {
                log::debug!("Config cache hit for '{}'", source.id());
                return Ok(Arc::new(entry.config));
            }
            log::debug!(
                "Config cache stale for '{}': cached={}, current={}",
                source.id(),
                entry.source_version,
                version
            );
        } else {
            log::debug!("Config cache miss for '{}'", source.id());
        }

        let config = ProjectConfig::parse(&source.read()?);
        if config.is_empty() {
            return Err(Error::config_load(
                source.id(),
                "configuration parsed to an empty result",
            ));
        }

        self.store_entry(&key, source.id(), CacheEntry::new(config.clone(), version));
        Ok(Arc::new(config))
    }

    fn lookup(&self, key: &str, source_id: &str) -> Option<CacheEntry> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Cache lookup failed for '{source_id}': {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Discarding corrupt cache entry for '{source_id}': {e}");
                None
            }
        }
    }

    fn store_entry(&self, key: &str, source_id: &str, entry: CacheEntry) {
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to serialize cache entry for '{source_id}': {e}");
                return;
            }
        };
        if let Err(e) = self.store.put(key, raw, self.ttl) {
            log::warn!("Failed to cache config for '{source_id}': {e}");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
