//! Connection value resolution and search failover.
//!
//! A connection value is a `;`-separated list of `host[:port]` segments.
//! Whitespace around segments is ignored and empty segments are dropped.
//! The same value is read two different ways:
//!
//! - **Index** ([`resolve_index`]): the first segment is the primary target,
//!   the rest are shards. Every one of them receives every write.
//! - **Search** ([`resolve_search`]): all segments are interchangeable
//!   replicas. They are shuffled, then tried one at a time by [`Failover`]
//!   until one connects.
//!
//! ```text
//! "host1:8383;host2:8383;host3:8383"
//!
//!   index  → primary host1:8383, shards [host2:8383, host3:8383]
//!   search → shuffle → try host3 ✗ → try host1 ✓ (stop)
//! ```

use std::fmt;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{Error, Result};

/// Host used when a segment is a bare port.
pub const DEFAULT_HOST: &str = "localhost";

/// Port of the index server when nothing is configured.
pub const DEFAULT_INDEX_PORT: u16 = 8383;

/// Port of the search server when nothing is configured.
pub const DEFAULT_SEARCH_PORT: u16 = 8384;

/// One backend node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    address: String,
    timeout: Option<Duration>,
}

impl ServerTarget {
    /// Build a target from one connection segment. A bare port such as
    /// `"8383"` means that port on [`DEFAULT_HOST`].
    pub fn new(segment: &str) -> Self {
        let segment = segment.trim();
        let address = match segment.parse::<u16>() {
            Ok(port) => format!("{DEFAULT_HOST}:{port}"),
            Err(_) => segment.to_string(),
        };
        Self {
            address,
            timeout: None,
        }
    }

    /// A target on the local host.
    pub fn local(port: u16) -> Self {
        Self::new(&port.to_string())
    }

    /// Override the timeout for this target only. Zero means no timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `host[:port]` as configured.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Host part of the address.
    pub fn host(&self) -> &str {
        match self.split_port() {
            Some((host, _)) => host,
            None => &self.address,
        }
    }

    /// Port part of the address, if present and numeric.
    pub fn port(&self) -> Option<u16> {
        self.split_port().map(|(_, port)| port)
    }

    /// Per-target timeout override.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The override if set, otherwise `default`.
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.unwrap_or(default)
    }

    fn split_port(&self) -> Option<(&str, u16)> {
        let (host, port) = self.address.rsplit_once(':')?;
        port.parse().ok().map(|p| (host, p))
    }
}

impl fmt::Display for ServerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Split a connection value into trimmed, non-empty segments.
pub fn split_segments(value: &str) -> Vec<&str> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// ============================================================================
// Index resolution
// ============================================================================

/// Primary index target plus the shards that also receive writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTargets {
    primary: ServerTarget,
    shards: Vec<ServerTarget>,
}

impl IndexTargets {
    /// The connection opened first.
    pub fn primary(&self) -> &ServerTarget {
        &self.primary
    }

    /// Additional write targets, in configured order.
    pub fn shards(&self) -> &[ServerTarget] {
        &self.shards
    }

    /// Primary followed by every shard.
    pub fn all(&self) -> impl Iterator<Item = &ServerTarget> {
        std::iter::once(&self.primary).chain(self.shards.iter())
    }

    /// Apply a timeout to every target that has no override yet.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        for target in std::iter::once(&mut self.primary).chain(self.shards.iter_mut()) {
            if target.timeout.is_none() {
                target.timeout = Some(timeout);
            }
        }
        self
    }
}

/// Resolve an index connection value into primary + shards.
///
/// Everything before the first `;` is the primary; the rest is the shard
/// list. An empty primary promotes the first shard, and a value with no
/// usable segment (or no value) falls back to `localhost:8383`.
pub fn resolve_index(value: Option<&str>) -> IndexTargets {
    let Some(value) = value else {
        return default_index();
    };

    let (head, tail) = match value.split_once(';') {
        Some((head, tail)) => (head, tail),
        None => (value, ""),
    };
    let mut shards: Vec<ServerTarget> = split_segments(tail)
        .into_iter()
        .map(ServerTarget::new)
        .collect();

    let head = head.trim();
    let primary = if !head.is_empty() {
        ServerTarget::new(head)
    } else if !shards.is_empty() {
        shards.remove(0)
    } else {
        return default_index();
    };

    log::debug!(
        "Resolved index targets: primary={primary}, shards={}",
        shards.len()
    );
    IndexTargets { primary, shards }
}

fn default_index() -> IndexTargets {
    IndexTargets {
        primary: ServerTarget::local(DEFAULT_INDEX_PORT),
        shards: Vec::new(),
    }
}

// ============================================================================
// Search resolution
// ============================================================================

/// Ordered, never-empty list of interchangeable search targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidates {
    ordered: Vec<ServerTarget>,
}

impl SearchCandidates {
    /// Candidates in the order they will be tried.
    pub fn targets(&self) -> &[ServerTarget] {
        &self.ordered
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Always false; kept alongside `len`.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Apply a timeout to every candidate that has no override yet.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        for target in &mut self.ordered {
            if target.timeout.is_none() {
                target.timeout = Some(timeout);
            }
        }
        self
    }
}

/// Resolve a search connection value into shuffled failover candidates.
pub fn resolve_search(value: Option<&str>) -> SearchCandidates {
    resolve_search_with(value, &mut rand::rng())
}

/// Like [`resolve_search`] with an explicit random source.
pub fn resolve_search_with<R: Rng + ?Sized>(value: Option<&str>, rng: &mut R) -> SearchCandidates {
    let mut ordered = search_segments(value);
    if ordered.len() > 1 {
        ordered.shuffle(rng);
    }
    log::debug!(
        "Resolved search candidates: [{}]",
        ordered
            .iter()
            .map(ServerTarget::address)
            .collect::<Vec<_>>()
            .join(", ")
    );
    SearchCandidates { ordered }
}

/// The first configured search segment, unshuffled; used for the tokenizer.
pub fn first_search_target(value: Option<&str>) -> ServerTarget {
    search_segments(value)
        .into_iter()
        .next()
        .unwrap_or_else(|| ServerTarget::local(DEFAULT_SEARCH_PORT))
}

fn search_segments(value: Option<&str>) -> Vec<ServerTarget> {
    let targets: Vec<ServerTarget> = value
        .map(split_segments)
        .unwrap_or_default()
        .into_iter()
        .map(ServerTarget::new)
        .collect();
    if targets.is_empty() {
        vec![ServerTarget::local(DEFAULT_SEARCH_PORT)]
    } else {
        targets
    }
}

// ============================================================================
// Failover
// ============================================================================

/// Where a [`Failover`] run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverState {
    /// Untried candidates remain.
    CandidatesRemaining,
    /// A candidate connected; remaining ones were skipped.
    Connected,
    /// Every candidate failed.
    Exhausted,
}

/// A successful failover attempt.
#[derive(Debug)]
pub struct Connected<T> {
    /// The open connection.
    pub connection: T,
    /// The candidate that accepted it.
    pub target: ServerTarget,
    /// How many candidates failed before it.
    pub failed_attempts: usize,
}

/// Sequential first-success connection over an ordered candidate list.
///
/// Candidates are tried strictly one at a time, never concurrently. Any
/// error from an attempt moves the cursor to the next candidate. When the
/// last candidate fails its error is returned.
#[derive(Debug)]
pub struct Failover {
    candidates: Vec<ServerTarget>,
    cursor: usize,
    failed: usize,
    state: FailoverState,
}

impl Failover {
    /// Prepare a run over the given candidates.
    pub fn new(candidates: SearchCandidates) -> Self {
        Self::over(candidates.ordered)
    }

    /// Prepare a run over an explicit, already-ordered list.
    pub fn over(candidates: Vec<ServerTarget>) -> Self {
        let state = if candidates.is_empty() {
            FailoverState::Exhausted
        } else {
            FailoverState::CandidatesRemaining
        };
        Self {
            candidates,
            cursor: 0,
            failed: 0,
            state,
        }
    }

    /// Current state.
    pub fn state(&self) -> FailoverState {
        self.state
    }

    /// Number of failed attempts so far.
    pub fn failed_attempts(&self) -> usize {
        self.failed
    }

    /// Try candidates in order until `connect` succeeds.
    ///
    /// # Errors
    ///
    /// The last candidate's error when all fail. [`Error::Config`] when there
    /// are no candidates, or when this run already connected or ran out.
    pub fn run<T, F>(&mut self, mut connect: F) -> Result<Connected<T>>
    where
        F: FnMut(&ServerTarget) -> Result<T>,
    {
        match self.state {
            FailoverState::Connected => {
                return Err(Error::config("failover already connected"));
            }
            FailoverState::Exhausted if self.cursor > 0 => {
                return Err(Error::config("failover candidates already exhausted"));
            }
            _ => {}
        }

        let mut last_error: Option<Error> = None;

        while self.state == FailoverState::CandidatesRemaining {
            let target = &self.candidates[self.cursor];
            self.cursor += 1;

            match connect(target) {
                Ok(connection) => {
                    self.state = FailoverState::Connected;
                    return Ok(Connected {
                        connection,
                        target: target.clone(),
                        failed_attempts: self.failed,
                    });
                }
                Err(e) => {
                    self.failed += 1;
                    log::warn!(
                        "Search candidate {target} failed ({}/{}): {e}",
                        self.cursor,
                        self.candidates.len()
                    );
                    last_error = Some(e);
                    if self.cursor == self.candidates.len() {
                        self.state = FailoverState::Exhausted;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::config("no search candidates to try")))
    }
}

// ============================================================================
// Tests
// ============================================================================
