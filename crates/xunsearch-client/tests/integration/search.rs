//! Search handle creation: shuffled candidates, sequential failover.

use std::sync::Arc;
use std::time::Duration;

use xunsearch_client::ClientSettings;

use crate::common::{MockConnector, client_for, client_with, demo_dir};

fn attempted(backend: &MockConnector) -> Vec<String> {
    backend
        .events_with("open_search ")
        .into_iter()
        .map(|e| e.trim_start_matches("open_search ").to_string())
        .collect()
}

#[test]
fn test_search_fails_over_to_reachable_candidate() {
    let dir = demo_dir("server.search = a:1;b:2;c:3");
    let backend = MockConnector::new();
    backend.refuse("a:1");
    backend.refuse("b:2");
    let client = client_for(&dir, &backend);

    let search = client.search("demo").unwrap();

    assert_eq!(search.target().address(), "c:3");
    let tried = attempted(&backend);
    assert_eq!(tried.last().map(String::as_str), Some("c:3"));
    assert_eq!(search.failed_attempts(), tried.len() - 1);
    assert!(tried[..tried.len() - 1].iter().all(|t| t != "c:3"));
}

#[test]
fn test_search_all_unreachable_propagates_last_failure() {
    let dir = demo_dir("server.search = a:1;b:2;c:3");
    let backend = MockConnector::new();
    for address in ["a:1", "b:2", "c:3"] {
        backend.refuse(address);
    }
    let client = client_for(&dir, &backend);

    let err = client.search("demo").unwrap_err();

    let tried = attempted(&backend);
    assert_eq!(tried.len(), 3);
    assert!(err.is_connection());
    assert_eq!(err.target(), tried.last().map(String::as_str));
}

#[test]
fn test_search_setup_failure_moves_to_next_candidate() {
    let dir = demo_dir("server.search = a:1;b:2");

    for _ in 0..20 {
        let backend = MockConnector::new();
        backend.reject_setup("a:1");
        let client = client_for(&dir, &backend);

        let search = client.search("demo").unwrap();

        assert_eq!(search.target().address(), "b:2");
        let tried = attempted(&backend);
        assert_eq!(search.failed_attempts(), tried.len() - 1);
    }
}

#[test]
fn test_search_shuffles_candidates() {
    let dir = demo_dir("server.search = a:1;b:2;c:3;d:4");
    let mut firsts = std::collections::HashSet::new();

    for _ in 0..64 {
        let backend = MockConnector::new();
        let client = client_for(&dir, &backend);
        let search = client.search("demo").unwrap();
        firsts.insert(search.target().address().to_string());
    }

    assert!(firsts.len() > 1, "always connected to {firsts:?}");
}

#[test]
fn test_search_is_memoized() {
    let dir = demo_dir("server.search = a:1;b:2");
    let backend = MockConnector::new();
    let client = client_for(&dir, &backend);

    let first = client.search("demo").unwrap();
    let second = client.search("demo").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(attempted(&backend).len(), 1);
}

#[test]
fn test_search_defaults_to_local_port() {
    let dir = demo_dir("");
    let backend = MockConnector::new();
    let client = client_for(&dir, &backend);

    let search = client.search("demo").unwrap();
    assert_eq!(search.target().address(), "localhost:8384");
    assert_eq!(search.failed_attempts(), 0);
}

#[test]
fn test_search_applies_project_charset() {
    let dir = demo_dir("server.search = s:1");
    let backend = MockConnector::new();
    let client = client_for(&dir, &backend);

    let search = client.search("demo").unwrap();

    assert_eq!(search.charset(), "GBK");
    assert_eq!(
        backend.events_with("search."),
        vec![
            "search.set_project s:1 demo",
            "search.set_timeout s:1 0",
            "search.set_charset s:1 GBK",
        ]
    );
}

#[test]
fn test_search_charset_override() {
    let dir = demo_dir("server.search = s:1");
    let backend = MockConnector::new();
    let client = client_for(&dir, &backend);

    client.set_default_charset("big5");
    let search = client.search("demo").unwrap();

    assert_eq!(search.charset(), "BIG5");
    assert_eq!(client.default_charset(), "BIG5");
}

#[test]
fn test_search_timeout_from_settings() {
    let dir = demo_dir("");
    let backend = MockConnector::new();
    let settings = ClientSettings::default()
        .with_schema_dir(dir.path())
        .with_server_search("s:1")
        .with_search_timeout(Duration::from_secs(5));
    let client = client_with(settings, &backend);

    client.search("demo").unwrap();
    assert_eq!(
        backend.events_with("search.set_timeout"),
        vec!["search.set_timeout s:1 5"]
    );
}

#[test]
fn test_index_and_search_share_scheme() {
    let dir = demo_dir("server.search = s:1");
    let backend = MockConnector::new();
    let client = client_for(&dir, &backend);

    let index = client.index("demo").unwrap();
    let search = client.search("demo").unwrap();

    assert!(Arc::ptr_eq(index.scheme(), search.scheme()));
}
