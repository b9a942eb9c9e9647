//! # xunsearch-redis
//!
//! A Redis-backed [`CacheStore`] so that parsed project configs are shared
//! by every process talking to the same Redis instance.
//!
//! Values are plain strings written with `SET ... EX`; Redis enforces the
//! TTL. Keys may be namespaced so several deployments can share one
//! database.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xunsearch_core::CachedConfigLoader;
//! use xunsearch_redis::RedisCacheStore;
//!
//! let store = RedisCacheStore::open("redis://127.0.0.1/")?.with_namespace("app1:");
//! let loader = CachedConfigLoader::new(Arc::new(store));
//! # Ok::<(), xunsearch_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use redis::{Client, Commands, Connection};
use xunsearch_core::{CacheStore, Error, Result};

/// [`CacheStore`] over a single lazily-opened Redis connection.
///
/// A connection that fails a command is dropped and reopened on the next
/// call.
pub struct RedisCacheStore {
    client: Client,
    namespace: String,
    timeout: Option<Duration>,
    connection: Mutex<Option<Connection>>,
}

impl RedisCacheStore {
    /// Create a store for a `redis://` URL. No connection is made yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cache`] when the URL is invalid.
    pub fn open(url: &str) -> Result<Self> {
        let client = Client::open(url).map_err(|e| Error::cache(format!("Invalid Redis URL: {e}")))?;
        Ok(Self {
            client,
            namespace: String::new(),
            timeout: None,
            connection: Mutex::new(None),
        })
    }

    /// Prefix every key with `namespace`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Bound connect, read and write time.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The key actually written to Redis.
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}{key}", self.namespace)
    }

    fn connect(&self) -> redis::RedisResult<Connection> {
        match self.timeout {
            Some(timeout) => {
                let connection = self.client.get_connection_with_timeout(timeout)?;
                connection.set_read_timeout(Some(timeout))?;
                connection.set_write_timeout(Some(timeout))?;
                Ok(connection)
            }
            None => self.client.get_connection(),
        }
    }

    fn with_connection<T>(
        &self,
        op: &str,
        f: impl FnOnce(&mut Connection) -> redis::RedisResult<T>,
    ) -> Result<T> {
        let mut slot = self.connection.lock().unwrap_or_else(PoisonError::into_inner);
        let mut connection = match slot.take() {
            Some(connection) => connection,
            None => self
                .connect()
                .map_err(|e| Error::cache(format!("Redis connect failed: {e}")))?,
        };

        match f(&mut connection) {
            Ok(value) => {
                *slot = Some(connection);
                Ok(value)
            }
            Err(e) => {
                log::debug!("Dropping Redis connection after failed {op}");
                Err(Error::cache(format!("Redis {op} failed: {e}")))
            }
        }
    }
}

impl CacheStore for RedisCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let key = self.namespaced(key);
        self.with_connection("GET", |conn| conn.get(&key))
    }

    fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let key = self.namespaced(key);
        // EX 0 is rejected by Redis.
        let seconds = ttl.as_secs().max(1);
        self.with_connection("SET", |conn| conn.set_ex(&key, value, seconds))
    }
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
