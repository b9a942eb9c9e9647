//! Facade state: active project, field accessors, tokenizer.

use std::fs::File;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{Duration, SystemTime};

use xunsearch_client::{
    BackendConnector, ClientSettings, DEFAULT_CHARSET, Error, IndexConnection, Result,
    SearchConnection, ServerTarget, TokenizerConnection, XunsearchClient,
};
use xunsearch_core::FieldRole;

use crate::common::{DEMO_INI, MockConnector, client_for, client_with, demo_dir, write_ini};

// ----------------------------------------------------------------------------
// Active project and field accessors
// ----------------------------------------------------------------------------

#[test]
fn test_accessors_without_project() {
    let dir = demo_dir("");
    let client = client_for(&dir, &MockConnector::new());

    assert!(client.project_name().is_none());
    assert!(matches!(client.field_id(), Err(Error::NoActiveProject)));
    assert!(client.try_field("pid").is_none());
    assert_eq!(client.default_charset(), DEFAULT_CHARSET);
}

#[test]
fn test_accessors_before_load() {
    let dir = demo_dir("");
    let client = client_for(&dir, &MockConnector::new());

    client.set_project_name("demo");
    assert_eq!(client.project_name().as_deref(), Some("demo"));
    assert!(matches!(client.all_fields(), Err(Error::NoScheme)));
    assert!(matches!(client.config(), Err(Error::NoScheme)));
}

#[test]
fn test_field_accessors_delegate_to_scheme() {
    let dir = demo_dir("");
    let client = client_for(&dir, &MockConnector::new());

    client.load_project("demo").unwrap();

    assert_eq!(client.field_id().unwrap().name(), "pid");
    assert_eq!(client.field_title().unwrap().unwrap().name(), "subject");
    assert_eq!(client.field_body().unwrap().unwrap().name(), "message");
    assert_eq!(client.field("chrono").unwrap().role(), FieldRole::Plain);
    assert_eq!(client.field(1usize).unwrap().name(), "subject");
    assert_eq!(client.try_field("chrono").unwrap().vno(), 3);
    assert!(client.try_field("missing").is_none());

    let names: Vec<String> = client
        .all_fields()
        .unwrap()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    assert_eq!(names, vec!["pid", "subject", "message", "chrono"]);
}

#[test]
fn test_strict_field_lookup_fails() {
    let dir = demo_dir("");
    let client = client_for(&dir, &MockConnector::new());
    client.load_project("demo").unwrap();

    let err = client.field("missing").unwrap_err();
    assert!(matches!(
        err,
        Error::Core(xunsearch_core::Error::FieldNotFound { .. })
    ));
    assert!(client.field(42usize).is_err());
}

#[test]
fn test_config_and_charset_of_active_project() {
    let dir = demo_dir("");
    let client = client_for(&dir, &MockConnector::new());
    client.load_project("demo").unwrap();

    let config = client.config().unwrap();
    assert_eq!(config.scalar("project.name"), Some("demo"));
    assert!(config.section("pid").is_some());
    assert_eq!(client.default_charset(), "GBK");
}

#[test]
fn test_switching_project_keeps_memoized_handles() {
    let dir = demo_dir("");
    write_ini(dir.path(), "other", &format!("project.name = other\n{DEMO_INI}"));
    let backend = MockConnector::new();
    let client = client_for(&dir, &backend);

    let demo = client.index("demo").unwrap();
    let other = client.index("other").unwrap();
    assert_eq!(client.project_name().as_deref(), Some("other"));
    assert!(!Arc::ptr_eq(&demo, &other));

    client.set_project_name("demo");
    let again = client.active_index().unwrap();
    assert!(Arc::ptr_eq(&demo, &again));
    assert_eq!(backend.events_with("open_index").len(), 2);
}

#[test]
fn test_active_handles_need_a_project() {
    let client = client_with(ClientSettings::default(), &MockConnector::new());
    assert!(matches!(client.active_index(), Err(Error::NoActiveProject)));
    assert!(matches!(client.active_search(), Err(Error::NoActiveProject)));
}

#[test]
fn test_backend_bound_to_requested_project_name() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ClientSettings::default().with_schema("alias", dir.path().join("real.ini"));
    write_ini(dir.path(), "real", DEMO_INI);
    let backend = MockConnector::new();
    let client = client_with(settings, &backend);

    let index = client.index("alias").unwrap();
    assert_eq!(index.project(), "alias");
    assert_eq!(backend.events_with("index.set_project"), vec!["index.set_project alias"]);
}

#[test]
fn test_charset_override_dropped_on_project_switch() {
    let dir = demo_dir("");
    write_ini(dir.path(), "other", "project.default_charset = big5\n[id]\ntype = id\n");
    let client = client_for(&dir, &MockConnector::new());

    client.load_project("demo").unwrap();
    client.set_default_charset("utf-16");
    client.load_project("demo").unwrap();
    assert_eq!(client.default_charset(), "UTF-16");

    client.load_project("other").unwrap();
    assert_eq!(client.default_charset(), "BIG5");
}

// ----------------------------------------------------------------------------
// Connectors that call back into their client
// ----------------------------------------------------------------------------

/// Delegates to a [`MockConnector`] but reads the owning client's state from
/// inside every `open_*` call.
struct CallbackConnector {
    inner: MockConnector,
    client: OnceLock<Weak<XunsearchClient>>,
    seen: Mutex<Vec<String>>,
}

impl CallbackConnector {
    fn observe(&self) {
        if let Some(client) = self.client.get().and_then(Weak::upgrade) {
            let project = client.project_name().unwrap_or_default();
            let charset = client.default_charset();
            self.seen.lock().unwrap().push(format!("{project} {charset}"));
        }
    }
}

impl BackendConnector for CallbackConnector {
    fn open_index(&self, target: &ServerTarget) -> Result<Box<dyn IndexConnection>> {
        self.observe();
        self.inner.open_index(target)
    }

    fn open_search(&self, target: &ServerTarget) -> Result<Box<dyn SearchConnection>> {
        self.observe();
        self.inner.open_search(target)
    }

    fn open_tokenizer(&self, target: &ServerTarget) -> Result<Box<dyn TokenizerConnection>> {
        self.observe();
        self.inner.open_tokenizer(target)
    }
}

#[test]
fn test_connector_may_call_back_into_client() {
    let dir = demo_dir("server.search = s:1");
    let connector = Arc::new(CallbackConnector {
        inner: MockConnector::new(),
        client: OnceLock::new(),
        seen: Mutex::new(Vec::new()),
    });
    let client = XunsearchClient::new(
        ClientSettings::default().with_schema_dir(dir.path()),
        connector.clone(),
        Arc::new(xunsearch_core::MemoryCacheStore::new()),
    );
    connector.client.set(Arc::downgrade(&client)).unwrap();

    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(&client);
    std::thread::spawn(move || {
        let outcome = (
            worker.index("demo").is_ok(),
            worker.search("demo").is_ok(),
            worker.tokenizer().is_ok(),
        );
        tx.send(outcome).unwrap();
    });

    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(outcome, (true, true, true));
    assert_eq!(
        *connector.seen.lock().unwrap(),
        vec!["demo GBK", "demo GBK", "demo GBK"]
    );
}

// ----------------------------------------------------------------------------
// Scheme reuse and reload
// ----------------------------------------------------------------------------

#[test]
fn test_scheme_reused_while_source_unchanged() {
    let dir = demo_dir("");
    let client = client_for(&dir, &MockConnector::new());

    let first = client.load_project("demo").unwrap();
    let second = client.load_project("demo").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_huge_cache_ttl_loads() {
    let dir = demo_dir("");
    let settings = ClientSettings::default()
        .with_schema_dir(dir.path())
        .with_cache_ttl(Duration::MAX);
    let client = client_with(settings, &MockConnector::new());

    let first = client.load_project("demo").unwrap();
    let second = client.load_project("demo").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_scheme_rebuilt_when_source_changes() {
    let dir = demo_dir("");
    let client = client_for(&dir, &MockConnector::new());
    let first = client.load_project("demo").unwrap();

    let path = dir.path().join("demo.ini");
    std::fs::write(&path, "[doc_id]\ntype = id\n").unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(120))
        .unwrap();

    let second = client.load_project("demo").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.field_id().name(), "doc_id");
    assert_eq!(client.field_id().unwrap().name(), "doc_id");
}

// ----------------------------------------------------------------------------
// Tokenizer and utilities
// ----------------------------------------------------------------------------

#[test]
fn test_tokenizer_created_once_on_first_segment() {
    let dir = demo_dir("server.search = t1:8384;t2:8384;t3:8384");
    let backend = MockConnector::new();
    let client = client_for(&dir, &backend);
    client.load_project("demo").unwrap();

    let first = client.tokenizer().unwrap();
    let second = client.tokenizer().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.target().address(), "t1:8384");
    assert_eq!(first.connection().target().address(), "t1:8384");
    assert_eq!(backend.events_with("open_tokenizer"), vec!["open_tokenizer t1:8384"]);
}

#[test]
fn test_tokenizer_without_project_uses_settings() {
    let backend = MockConnector::new();
    let client = client_with(
        ClientSettings::default().with_server_search("s:9;s:10"),
        &backend,
    );

    assert_eq!(client.tokenizer().unwrap().target().address(), "s:9");
}

#[test]
fn test_tokenizer_failure_not_memoized() {
    let backend = MockConnector::new();
    backend.refuse("localhost:8384");
    let client = client_with(ClientSettings::default(), &backend);

    assert!(client.tokenizer().unwrap_err().is_connection());
    assert!(client.tokenizer().is_err());
    assert_eq!(backend.events_with("open_tokenizer").len(), 2);
}

#[test]
fn test_static_utilities() {
    assert_eq!(XunsearchClient::geo_distance(116.4, 39.9, 116.4, 39.9), 0.0);

    let value = xunsearch_core::CharsetValue::from("plain");
    let out = XunsearchClient::convert(value.clone(), "GBK", "UTF-8").unwrap();
    assert_eq!(out, value);
}
