//! Project configuration: parsing and cached loading.
//!
//! # Modules
//!
//! - [`parser`]: ini text → [`ProjectConfig`]
//! - [`cache`]: the [`CacheStore`] collaborator and [`CacheEntry`] format
//! - [`loader`]: [`CachedConfigLoader`], mtime-checked read-through cache

pub mod cache;
pub mod loader;
pub mod parser;

pub use cache::{CacheEntry, CacheStore, DEFAULT_CACHE_TTL, MemoryCacheStore};
pub use loader::{CACHE_KEY_PREFIX, CachedConfigLoader, ConfigSource, FileSource, cache_key};
pub use parser::{ConfigValue, ProjectConfig, Section};

/// Top-level key holding the index server connection value.
pub const KEY_SERVER_INDEX: &str = "server.index";

/// Top-level key holding the search server connection value.
pub const KEY_SERVER_SEARCH: &str = "server.search";

/// Top-level key holding the project name.
pub const KEY_PROJECT_NAME: &str = "project.name";

/// Top-level key holding the project's default charset.
pub const KEY_DEFAULT_CHARSET: &str = "project.default_charset";
