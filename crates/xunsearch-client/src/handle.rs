//! Memoized backend handles.
//!
//! A handle pairs an open backend connection with the project it serves and
//! that project's [`FieldScheme`]. Handles are created by the facade and
//! shared as `Arc`s; the connection sits behind a mutex so a handle can be
//! used from any thread that holds it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use xunsearch_core::FieldScheme;

use crate::backend::{IndexConnection, SearchConnection, TokenizerConnection};
use crate::resolver::{IndexTargets, ServerTarget};

/// Write access to one project: a primary index connection with every shard
/// attached.
pub struct IndexHandle {
    project: String,
    scheme: Arc<FieldScheme>,
    targets: IndexTargets,
    connection: Mutex<Box<dyn IndexConnection>>,
}

impl IndexHandle {
    pub(crate) fn new(
        project: String,
        scheme: Arc<FieldScheme>,
        targets: IndexTargets,
        connection: Box<dyn IndexConnection>,
    ) -> Self {
        Self {
            project,
            scheme,
            targets,
            connection: Mutex::new(connection),
        }
    }

    /// Project this handle writes to.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The project's field scheme.
    pub fn scheme(&self) -> &Arc<FieldScheme> {
        &self.scheme
    }

    /// Primary and shard targets this handle writes to.
    pub fn targets(&self) -> &IndexTargets {
        &self.targets
    }

    /// Exclusive access to the underlying connection.
    pub fn connection(&self) -> MutexGuard<'_, Box<dyn IndexConnection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("project", &self.project)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

/// Query access to one project through whichever replica accepted the
/// connection.
pub struct SearchHandle {
    project: String,
    scheme: Arc<FieldScheme>,
    target: ServerTarget,
    charset: String,
    failed_attempts: usize,
    connection: Mutex<Box<dyn SearchConnection>>,
}

impl SearchHandle {
    pub(crate) fn new(
        project: String,
        scheme: Arc<FieldScheme>,
        target: ServerTarget,
        charset: String,
        failed_attempts: usize,
        connection: Box<dyn SearchConnection>,
    ) -> Self {
        Self {
            project,
            scheme,
            target,
            charset,
            failed_attempts,
            connection: Mutex::new(connection),
        }
    }

    /// Project this handle queries.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The project's field scheme.
    pub fn scheme(&self) -> &Arc<FieldScheme> {
        &self.scheme
    }

    /// The replica this handle is bound to.
    pub fn target(&self) -> &ServerTarget {
        &self.target
    }

    /// Charset applied to the connection when it was opened.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Candidates that failed before this one connected.
    pub fn failed_attempts(&self) -> usize {
        self.failed_attempts
    }

    /// Exclusive access to the underlying connection.
    pub fn connection(&self) -> MutexGuard<'_, Box<dyn SearchConnection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SearchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchHandle")
            .field("project", &self.project)
            .field("target", &self.target)
            .field("charset", &self.charset)
            .field("failed_attempts", &self.failed_attempts)
            .finish_non_exhaustive()
    }
}

/// The shared tokenizer connection.
pub struct TokenizerHandle {
    target: ServerTarget,
    connection: Mutex<Box<dyn TokenizerConnection>>,
}

impl TokenizerHandle {
    pub(crate) fn new(target: ServerTarget, connection: Box<dyn TokenizerConnection>) -> Self {
        Self {
            target,
            connection: Mutex::new(connection),
        }
    }

    /// The tokenizer server.
    pub fn target(&self) -> &ServerTarget {
        &self.target
    }

    /// Exclusive access to the underlying connection.
    pub fn connection(&self) -> MutexGuard<'_, Box<dyn TokenizerConnection>> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TokenizerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizerHandle")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
