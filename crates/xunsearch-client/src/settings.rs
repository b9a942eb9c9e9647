//! Client-wide settings.
//!
//! Settings describe where project ini files live and which servers to use
//! when a project does not name its own. They are loaded from TOML:
//!
//! ```toml
//! server_index = "10.0.0.1:8383;10.0.0.2:8383"
//! server_search = "10.0.0.3:8384;10.0.0.4:8384"
//! schema_dir = "/etc/xunsearch/app"
//! search_timeout_secs = 5
//!
//! [schemas]
//! demo = "/srv/demo/demo.ini"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings shared by every project a client serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Index connection value used when a project ini has no `server.index`.
    #[serde(default)]
    pub server_index: Option<String>,

    /// Search connection value used when a project ini has no `server.search`.
    #[serde(default)]
    pub server_search: Option<String>,

    /// Directory searched for `<project>.ini`.
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,

    /// Explicit project → ini path map, consulted before `schema_dir`.
    #[serde(default)]
    pub schemas: HashMap<String, PathBuf>,

    /// Lifetime of cached parsed configs, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Index request timeout in seconds; 0 means none.
    #[serde(default)]
    pub index_timeout_secs: u64,

    /// Search request timeout in seconds; 0 means none.
    #[serde(default)]
    pub search_timeout_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    xunsearch_core::config::DEFAULT_CACHE_TTL.as_secs()
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_index: None,
            server_search: None,
            schema_dir: None,
            schemas: HashMap::new(),
            cache_ttl_secs: default_cache_ttl_secs(),
            index_timeout_secs: 0,
            search_timeout_secs: 0,
        }
    }
}

impl ClientSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Set the fallback index connection value.
    pub fn with_server_index(mut self, value: impl Into<String>) -> Self {
        self.server_index = Some(value.into());
        self
    }

    /// Set the fallback search connection value.
    pub fn with_server_search(mut self, value: impl Into<String>) -> Self {
        self.server_search = Some(value.into());
        self
    }

    /// Set the directory searched for project ini files.
    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    /// Map one project to an explicit ini file.
    pub fn with_schema(mut self, project: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.schemas.insert(project.into(), path.into());
        self
    }

    /// Set the cache lifetime of parsed configs.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the index request timeout.
    pub fn with_index_timeout(mut self, timeout: Duration) -> Self {
        self.index_timeout_secs = timeout.as_secs();
        self
    }

    /// Set the search request timeout.
    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout_secs = timeout.as_secs();
        self
    }

    /// Cache lifetime as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Index timeout as a [`Duration`].
    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }

    /// Search timeout as a [`Duration`].
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    /// Locate the ini file for a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the project is neither mapped
    /// explicitly nor covered by `schema_dir`.
    pub fn schema_path(&self, project: &str) -> Result<PathBuf> {
        if let Some(path) = self.schemas.get(project) {
            return Ok(path.clone());
        }
        match &self.schema_dir {
            Some(dir) => Ok(dir.join(format!("{project}.ini"))),
            None => Err(Error::config(format!(
                "no schema configured for project '{project}'"
            ))),
        }
    }
}
