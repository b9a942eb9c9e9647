//! # xunsearch-client
//!
//! Per-project connection management for Xunsearch.
//!
//! This crate turns a project name into working backend handles:
//! - Index handles write to a primary server and every configured shard
//! - Search handles fail over across shuffled replicas
//! - A shared tokenizer handle, created once per client
//! - Field accessors over the active project's scheme
//!
//! The wire protocols are supplied by a [`BackendConnector`].
//!
//! # Modules
//!
//! - [`client`]: the [`XunsearchClient`] facade
//! - [`resolver`]: connection value parsing and the [`Failover`] loop
//! - [`backend`]: collaborator traits implemented by protocol crates
//! - [`handle`]: memoized index, search and tokenizer handles
//! - [`settings`]: TOML-backed [`ClientSettings`]
//! - [`error`]: Error types and Result alias

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod client;
pub mod error;
pub mod handle;
pub mod resolver;
pub mod settings;

pub use backend::{BackendConnector, IndexConnection, SearchConnection, TokenizerConnection};
pub use client::{DEFAULT_CHARSET, XunsearchClient};
pub use error::{Error, Result};
pub use handle::{IndexHandle, SearchHandle, TokenizerHandle};
pub use resolver::{
    Failover, FailoverState, IndexTargets, SearchCandidates, ServerTarget, resolve_index,
    resolve_search, resolve_search_with,
};
pub use settings::ClientSettings;
