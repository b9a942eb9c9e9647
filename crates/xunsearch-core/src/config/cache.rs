//! Cache store abstraction and the entry format kept in it.
//!
//! The store is an external collaborator: anything that can `get` and `put`
//! a string under a key with a TTL. [`MemoryCacheStore`] is the in-process
//! implementation; `xunsearch-redis` provides a shared one.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::parser::ProjectConfig;
use crate::error::Result;

/// Default lifetime of a cached config, one day.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Key/value store used to memoize parsed configuration.
///
/// Access is read-then-write with no transactional guarantee; concurrent
/// refreshes of one key simply overwrite each other.
pub trait CacheStore: Send + Sync {
    /// Fetch the value stored under `key`, if present and not expired.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key` for at most `ttl`.
    fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
}

/// What the loader keeps in the cache store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The parsed configuration.
    pub config: ProjectConfig,

    /// Modification time of the source when it was parsed.
    pub source_version: u64,

    /// When the entry was written (RFC 3339).
    pub cached_at: String,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(config: ProjectConfig, source_version: u64) -> Self {
        Self {
            config,
            source_version,
            cached_at: Utc::now().to_rfc3339(),
        }
    }

    /// Whether the entry was built from the given source version.
    pub fn is_fresh(&self, source_version: u64) -> bool {
        self.source_version == source_version
    }

    /// Get the write timestamp as a DateTime.
    pub fn cached_at_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.cached_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Expiry deadline; `None` when the TTL reaches past what `Instant` can hold.
type Expiry = Option<Instant>;

/// Process-local cache store honouring TTLs.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, (String, Expiry)>>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored (possibly expired) entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, Expiry)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some((_, Some(expires))) if *expires <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let expires = Instant::now().checked_add(ttl);
        self.lock().insert(key.to_string(), (value, expires));
        Ok(())
    }
}
