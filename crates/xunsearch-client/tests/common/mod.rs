//! Common test utilities for xunsearch-client integration tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use xunsearch_client::{
    BackendConnector, ClientSettings, Error, IndexConnection, Result, SearchConnection,
    ServerTarget, TokenizerConnection, XunsearchClient,
};
use xunsearch_core::MemoryCacheStore;

/// A project ini with one field of each role.
pub const DEMO_INI: &str = "\
project.name = demo
project.default_charset = gbk

[pid]
type = id

[subject]
type = title

[message]
type = body

[chrono]
type = numeric
";

#[derive(Default)]
struct Shared {
    unreachable: Mutex<HashSet<String>>,
    rejecting: Mutex<HashSet<String>>,
    log: Mutex<Vec<String>>,
}

impl Shared {
    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }

    fn check(&self, target: &ServerTarget) -> Result<()> {
        if self.unreachable.lock().unwrap().contains(target.address()) {
            Err(Error::connection(target.address(), "connection refused"))
        } else {
            Ok(())
        }
    }

    fn check_setup(&self, target: &ServerTarget) -> Result<()> {
        if self.rejecting.lock().unwrap().contains(target.address()) {
            Err(Error::config(format!("{target} rejected the project")))
        } else {
            Ok(())
        }
    }
}

/// In-memory backend that records every call it receives.
#[derive(Clone, Default)]
pub struct MockConnector {
    shared: Arc<Shared>,
}

impl MockConnector {
    /// A backend where every target is reachable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a target refuse connections.
    pub fn refuse(&self, address: &str) {
        self.shared
            .unreachable
            .lock()
            .unwrap()
            .insert(address.to_string());
    }

    /// Make a target accept connections but fail `set_project` with a
    /// non-connection error.
    pub fn reject_setup(&self, address: &str) {
        self.shared
            .rejecting
            .lock()
            .unwrap()
            .insert(address.to_string());
    }

    /// Every recorded call, oldest first.
    pub fn events(&self) -> Vec<String> {
        self.shared.log.lock().unwrap().clone()
    }

    /// Recorded calls starting with `prefix`.
    pub fn events_with(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }
}

impl BackendConnector for MockConnector {
    fn open_index(&self, target: &ServerTarget) -> Result<Box<dyn IndexConnection>> {
        self.shared.record(format!("open_index {target}"));
        self.shared.check(target)?;
        Ok(Box::new(MockIndex {
            shared: Arc::clone(&self.shared),
            servers: vec![target.clone()],
        }))
    }

    fn open_search(&self, target: &ServerTarget) -> Result<Box<dyn SearchConnection>> {
        self.shared.record(format!("open_search {target}"));
        self.shared.check(target)?;
        Ok(Box::new(MockSearch {
            shared: Arc::clone(&self.shared),
            target: target.clone(),
        }))
    }

    fn open_tokenizer(&self, target: &ServerTarget) -> Result<Box<dyn TokenizerConnection>> {
        self.shared.record(format!("open_tokenizer {target}"));
        self.shared.check(target)?;
        Ok(Box::new(MockTokenizer {
            target: target.clone(),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockIndex {
    shared: Arc<Shared>,
    servers: Vec<ServerTarget>,
}

impl IndexConnection for MockIndex {
    fn set_project(&mut self, name: &str) -> Result<()> {
        self.shared.record(format!("index.set_project {name}"));
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.shared
            .record(format!("index.set_timeout {}", timeout.as_secs()));
        Ok(())
    }

    fn add_server(&mut self, target: &ServerTarget) -> Result<()> {
        self.shared.record(format!("index.add_server {target}"));
        self.shared.check(target)?;
        self.servers.push(target.clone());
        Ok(())
    }

    fn servers(&self) -> Vec<ServerTarget> {
        self.servers.clone()
    }
}

struct MockSearch {
    shared: Arc<Shared>,
    target: ServerTarget,
}

impl SearchConnection for MockSearch {
    fn set_project(&mut self, name: &str) -> Result<()> {
        self.shared
            .record(format!("search.set_project {} {name}", self.target));
        self.shared.check_setup(&self.target)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.shared
            .record(format!("search.set_timeout {} {}", self.target, timeout.as_secs()));
        Ok(())
    }

    fn set_charset(&mut self, charset: &str) -> Result<()> {
        self.shared
            .record(format!("search.set_charset {} {charset}", self.target));
        Ok(())
    }
}

struct MockTokenizer {
    target: ServerTarget,
}

impl TokenizerConnection for MockTokenizer {
    fn target(&self) -> &ServerTarget {
        &self.target
    }
}

/// Write `<name>.ini` into `dir`.
pub fn write_ini(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(format!("{name}.ini")), text).unwrap();
}

/// A schema directory holding `demo.ini` plus `extra` lines appended to it.
pub fn demo_dir(extra: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_ini(dir.path(), "demo", &format!("{extra}\n{DEMO_INI}"));
    dir
}

/// A client reading schemas from `dir`, backed by `connector`.
pub fn client_for(dir: &TempDir, connector: &MockConnector) -> Arc<XunsearchClient> {
    client_with(ClientSettings::default().with_schema_dir(dir.path()), connector)
}

/// A client with explicit settings.
pub fn client_with(settings: ClientSettings, connector: &MockConnector) -> Arc<XunsearchClient> {
    XunsearchClient::new(
        settings,
        Arc::new(connector.clone()),
        Arc::new(MemoryCacheStore::new()),
    )
}
