//! The client facade.
//!
//! [`XunsearchClient`] turns a project name into working backend handles:
//!
//! ```text
//! index("demo") ──► memoized? ──yes──► Arc<IndexHandle>
//!                      │ no
//!                      ▼
//!        settings.schema_path ─► CachedConfigLoader ─► FieldScheme (reused
//!                      │                                 per distinct config)
//!                      ▼
//!        resolve_index ─► open primary ─► add_server(shard) for each shard
//! ```
//!
//! Search handles follow the same path but resolve through
//! [`resolve_search`] and connect with [`Failover`]. Handles are memoized
//! per `(project, role)` and never evicted.
//!
//! Backend I/O runs without the client's state lock held, so a connector may
//! call back into its owning client. When two callers race to open the same
//! handle, the first one stored wins and the other connection is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use xunsearch_core::config::{KEY_DEFAULT_CHARSET, KEY_SERVER_INDEX, KEY_SERVER_SEARCH};
use xunsearch_core::{
    CacheStore, CachedConfigLoader, CharsetValue, FieldKey, FieldMeta, FieldScheme, FileSource,
    ProjectConfig,
};

use crate::backend::BackendConnector;
use crate::error::{Error, Result};
use crate::handle::{IndexHandle, SearchHandle, TokenizerHandle};
use crate::resolver::{Failover, first_search_target, resolve_index, resolve_search};
use crate::settings::ClientSettings;

/// Charset used when a project declares none.
pub const DEFAULT_CHARSET: &str = "UTF-8";

static LAST_CLIENT: Mutex<Option<Weak<XunsearchClient>>> = Mutex::new(None);

/// A loaded project: its parsed config and the scheme built from it.
#[derive(Debug, Clone)]
struct LoadedProject {
    config: Arc<ProjectConfig>,
    scheme: Arc<FieldScheme>,
}

#[derive(Debug, Default)]
struct ClientState {
    project: Option<String>,
    charset: Option<String>,
    loaded: HashMap<String, LoadedProject>,
    index_handles: HashMap<String, Arc<IndexHandle>>,
    search_handles: HashMap<String, Arc<SearchHandle>>,
    tokenizer: Option<Arc<TokenizerHandle>>,
}

impl ClientState {
    fn active(&self) -> Result<&LoadedProject> {
        let name = self.project.as_deref().ok_or(Error::NoActiveProject)?;
        self.loaded.get(name).ok_or(Error::NoScheme)
    }

    /// Make `name` active. Moving to a different project drops the charset
    /// override.
    fn activate(&mut self, name: &str) {
        if self.project.as_deref().is_some_and(|current| current != name) {
            self.charset = None;
        }
        self.project = Some(name.to_string());
    }
}

/// Per-project orchestrator of index, search and tokenizer handles.
///
/// Several clients may coexist; [`XunsearchClient::last`] returns the most
/// recently constructed one that is still alive.
pub struct XunsearchClient {
    settings: ClientSettings,
    connector: Arc<dyn BackendConnector>,
    loader: CachedConfigLoader,
    state: Mutex<ClientState>,
}

impl XunsearchClient {
    /// Create a client and make it the process-wide last instance.
    pub fn new(
        settings: ClientSettings,
        connector: Arc<dyn BackendConnector>,
        store: Arc<dyn CacheStore>,
    ) -> Arc<Self> {
        let loader = CachedConfigLoader::new(store).with_ttl(settings.cache_ttl());
        let client = Arc::new(Self {
            settings,
            connector,
            loader,
            state: Mutex::new(ClientState::default()),
        });

        *LAST_CLIENT.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::downgrade(&client));
        log::debug!("Created client with {} backend", client.connector.name());
        client
    }

    /// The most recently constructed client, if it is still alive.
    pub fn last() -> Option<Arc<Self>> {
        LAST_CLIENT
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Settings this client was created with.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Project and charset
    // ------------------------------------------------------------------------

    /// Name of the active project.
    pub fn project_name(&self) -> Option<String> {
        self.state().project.clone()
    }

    /// Switch the active project without loading it.
    ///
    /// Handles already memoized for other projects are unaffected.
    pub fn set_project_name(&self, name: impl Into<String>) {
        let name: String = name.into();
        self.state().activate(&name);
    }

    /// Load (or reload, when its source changed) a project and make it
    /// active.
    ///
    /// # Errors
    ///
    /// Fails when no schema path is configured, the ini cannot be loaded, or
    /// its field scheme is invalid.
    pub fn load_project(&self, name: &str) -> Result<Arc<FieldScheme>> {
        let mut state = self.state();
        let loaded = self.load_into(&mut state, name)?;
        state.activate(name);
        Ok(loaded.scheme)
    }

    fn load_into(&self, state: &mut ClientState, name: &str) -> Result<LoadedProject> {
        let path = self.settings.schema_path(name)?;
        let config = self.loader.load(&FileSource::new(path))?;

        if let Some(existing) = state.loaded.get(name)
            && *existing.config == *config
        {
            return Ok(existing.clone());
        }

        let scheme = Arc::new(FieldScheme::from_config(&config)?);
        log::debug!("Built field scheme for '{name}' with {} fields", scheme.len());
        let loaded = LoadedProject { config, scheme };
        state.loaded.insert(name.to_string(), loaded.clone());
        Ok(loaded)
    }

    fn loaded_or_load(&self, state: &mut ClientState, name: &str) -> Result<LoadedProject> {
        match state.loaded.get(name) {
            Some(loaded) => Ok(loaded.clone()),
            None => self.load_into(state, name),
        }
    }

    /// Raw configuration of the active project.
    pub fn config(&self) -> Result<Arc<ProjectConfig>> {
        Ok(Arc::clone(&self.state().active()?.config))
    }

    /// Field scheme of the active project.
    pub fn scheme(&self) -> Result<Arc<FieldScheme>> {
        Ok(Arc::clone(&self.state().active()?.scheme))
    }

    /// Charset applied to search connections, upper-cased.
    ///
    /// An explicit [`set_default_charset`](Self::set_default_charset) wins,
    /// then the active project's `project.default_charset`, then `UTF-8`.
    pub fn default_charset(&self) -> String {
        charset_of(&self.state())
    }

    /// Override the charset applied to search connections opened from now
    /// on. The override lasts until another project becomes active.
    pub fn set_default_charset(&self, charset: &str) {
        self.state().charset = Some(charset.trim().to_ascii_uppercase());
    }

    // ------------------------------------------------------------------------
    // Field accessors
    // ------------------------------------------------------------------------

    /// The identifier field of the active project.
    pub fn field_id(&self) -> Result<FieldMeta> {
        Ok(self.scheme()?.field_id().clone())
    }

    /// The title field of the active project, if declared.
    pub fn field_title(&self) -> Result<Option<FieldMeta>> {
        Ok(self.scheme()?.field_title().cloned())
    }

    /// The body field of the active project, if declared.
    pub fn field_body(&self) -> Result<Option<FieldMeta>> {
        Ok(self.scheme()?.field_body().cloned())
    }

    /// A field by name or position; fails when it does not exist.
    pub fn field<'a>(&self, key: impl Into<FieldKey<'a>>) -> Result<FieldMeta> {
        Ok(self.scheme()?.field(key)?.clone())
    }

    /// A field by name or position; `None` when it does not exist or no
    /// project is loaded.
    pub fn try_field<'a>(&self, key: impl Into<FieldKey<'a>>) -> Option<FieldMeta> {
        self.scheme().ok()?.try_field(key).cloned()
    }

    /// Every field of the active project, in declaration order.
    pub fn all_fields(&self) -> Result<Vec<FieldMeta>> {
        Ok(self.scheme()?.fields().to_vec())
    }

    // ------------------------------------------------------------------------
    // Handles
    // ------------------------------------------------------------------------

    /// Get or create the index handle for a project, and make it active.
    ///
    /// The primary target and every shard must connect; any failure is
    /// returned and nothing is memoized.
    pub fn index(&self, project: &str) -> Result<Arc<IndexHandle>> {
        let loaded = {
            let mut state = self.state();
            state.activate(project);
            if let Some(handle) = state.index_handles.get(project) {
                return Ok(Arc::clone(handle));
            }
            self.loaded_or_load(&mut state, project)?
        };

        let handle = Arc::new(self.open_index(project, &loaded)?);
        let mut state = self.state();
        let stored = state
            .index_handles
            .entry(project.to_string())
            .or_insert(handle);
        Ok(Arc::clone(stored))
    }

    /// Get or create the search handle for a project, and make it active.
    ///
    /// Candidates are shuffled and tried one at a time; the last failure is
    /// returned when none connects.
    pub fn search(&self, project: &str) -> Result<Arc<SearchHandle>> {
        let (loaded, charset) = {
            let mut state = self.state();
            state.activate(project);
            if let Some(handle) = state.search_handles.get(project) {
                return Ok(Arc::clone(handle));
            }
            let loaded = self.loaded_or_load(&mut state, project)?;
            (loaded, charset_of(&state))
        };

        let handle = Arc::new(self.open_search(project, &loaded, charset)?);
        let mut state = self.state();
        let stored = state
            .search_handles
            .entry(project.to_string())
            .or_insert(handle);
        Ok(Arc::clone(stored))
    }

    /// Index handle of the active project.
    pub fn active_index(&self) -> Result<Arc<IndexHandle>> {
        let project = self.project_name().ok_or(Error::NoActiveProject)?;
        self.index(&project)
    }

    /// Search handle of the active project.
    pub fn active_search(&self) -> Result<Arc<SearchHandle>> {
        let project = self.project_name().ok_or(Error::NoActiveProject)?;
        self.search(&project)
    }

    /// Get or create the shared tokenizer handle.
    ///
    /// It connects to the first configured search segment of the active
    /// project (or of the settings) and is created at most once.
    pub fn tokenizer(&self) -> Result<Arc<TokenizerHandle>> {
        let target = {
            let state = self.state();
            if let Some(handle) = &state.tokenizer {
                return Ok(Arc::clone(handle));
            }
            let value = match state.active() {
                Ok(loaded) => self.connection_value(&loaded.config, KEY_SERVER_SEARCH),
                Err(_) => self.settings.server_search.clone(),
            };
            first_search_target(value.as_deref())
        };

        let connection = self.connector.open_tokenizer(&target)?;
        log::info!("Opened tokenizer on {target}");

        let handle = Arc::new(TokenizerHandle::new(target, connection));
        let mut state = self.state();
        Ok(Arc::clone(state.tokenizer.get_or_insert(handle)))
    }

    /// Project ini value first, then the settings fallback.
    fn connection_value(&self, config: &ProjectConfig, key: &str) -> Option<String> {
        let fallback = match key {
            KEY_SERVER_INDEX => self.settings.server_index.as_deref(),
            _ => self.settings.server_search.as_deref(),
        };
        config.scalar(key).or(fallback).map(str::to_string)
    }

    fn open_index(&self, project: &str, loaded: &LoadedProject) -> Result<IndexHandle> {
        let value = self.connection_value(&loaded.config, KEY_SERVER_INDEX);
        let timeout = self.settings.index_timeout();
        let targets = resolve_index(value.as_deref()).with_default_timeout(timeout);
        let primary = targets.primary();
        let mut connection = self.connector.open_index(primary)?;
        connection.set_project(project)?;
        connection.set_timeout(primary.timeout_or(timeout))?;
        for shard in targets.shards() {
            connection.add_server(shard)?;
        }

        log::info!(
            "Opened index for '{project}' on {primary} with {} shard(s)",
            targets.shards().len()
        );
        Ok(IndexHandle::new(
            project.to_string(),
            Arc::clone(&loaded.scheme),
            targets,
            connection,
        ))
    }

    fn open_search(&self, project: &str, loaded: &LoadedProject, charset: String) -> Result<SearchHandle> {
        let value = self.connection_value(&loaded.config, KEY_SERVER_SEARCH);
        let timeout = self.settings.search_timeout();
        let candidates = resolve_search(value.as_deref()).with_default_timeout(timeout);
        let connected = Failover::new(candidates).run(|target| {
            let mut connection = self.connector.open_search(target)?;
            connection.set_project(project)?;
            connection.set_timeout(target.timeout_or(timeout))?;
            connection.set_charset(&charset)?;
            Ok(connection)
        })?;

        log::info!(
            "Opened search for '{project}' on {} after {} failed attempt(s)",
            connected.target,
            connected.failed_attempts
        );
        Ok(SearchHandle::new(
            project.to_string(),
            Arc::clone(&loaded.scheme),
            connected.target,
            charset,
            connected.failed_attempts,
            connected.connection,
        ))
    }

    // ------------------------------------------------------------------------
    // Utilities
    // ------------------------------------------------------------------------

    /// Convert a value tree between charsets.
    pub fn convert(data: CharsetValue, to: &str, from: &str) -> Result<CharsetValue> {
        Ok(xunsearch_core::convert(data, to, from)?)
    }

    /// Approximate distance in meters between two `(lon, lat)` points.
    pub fn geo_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
        xunsearch_core::geo_distance(lon1, lat1, lon2, lat2)
    }
}

impl std::fmt::Debug for XunsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XunsearchClient")
            .field("settings", &self.settings)
            .field("backend", &self.connector.name())
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

fn charset_of(state: &ClientState) -> String {
    if let Some(charset) = &state.charset {
        return charset.clone();
    }
    state
        .active()
        .ok()
        .and_then(|loaded| loaded.config.scalar(KEY_DEFAULT_CHARSET))
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
}
