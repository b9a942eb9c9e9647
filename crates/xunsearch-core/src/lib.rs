//! Xunsearch Core — configuration, field schemes, and utilities.
//!
//! This crate holds everything a Xunsearch client needs before it opens a
//! single connection. It has no internal dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`config`]: ini parsing and the mtime-checked configuration cache
//! - [`scheme`]: validated field schemes built from a parsed configuration
//! - [`util`]: charset conversion and geo distance
//! - [`error`]: Error types and Result alias
//!
//! # Example
//!
//! ```rust
//! use xunsearch_core::{FieldScheme, ProjectConfig};
//!
//! let config = ProjectConfig::parse(
//!     "project.name = demo\n[pid]\ntype = id\n[subject]\ntype = title\n",
//! );
//! let scheme = FieldScheme::from_config(&config).unwrap();
//! assert_eq!(scheme.field_id().name(), "pid");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod scheme;
pub mod util;

// Re-export key types at crate root for convenience
pub use config::{
    CacheEntry, CacheStore, CachedConfigLoader, ConfigSource, ConfigValue, FileSource,
    MemoryCacheStore, ProjectConfig, Section,
};
pub use error::{Error, Result, SchemeRule};
pub use scheme::{FieldKey, FieldMeta, FieldRole, FieldScheme, FieldType, IndexMode};
pub use util::{CharsetValue, convert, geo_distance};
