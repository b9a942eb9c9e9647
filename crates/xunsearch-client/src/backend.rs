//! Backend collaborator traits.
//!
//! The index-write, search and tokenizer protocols live outside this crate.
//! The facade only needs to open a connection to one [`ServerTarget`] and
//! make a handful of setup calls on it, so that is all these traits expose.
//! Protocol crates implement [`BackendConnector`]; tests use an in-memory
//! mock.
//!
//! A connection attempt that cannot reach its target must fail with
//! [`Error::Connection`](crate::Error::Connection): that is the error the
//! search failover loop recovers from.

use std::time::Duration;

use crate::error::Result;
use crate::resolver::ServerTarget;

/// Opens backend connections.
pub trait BackendConnector: Send + Sync {
    /// Open a connection to an index server.
    fn open_index(&self, target: &ServerTarget) -> Result<Box<dyn IndexConnection>>;

    /// Open a connection to a search server.
    fn open_search(&self, target: &ServerTarget) -> Result<Box<dyn SearchConnection>>;

    /// Open a connection to the tokenizer service.
    fn open_tokenizer(&self, target: &ServerTarget) -> Result<Box<dyn TokenizerConnection>>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str {
        "backend"
    }
}

/// An open connection to an index (write) server.
pub trait IndexConnection: Send {
    /// Bind the connection to a project.
    fn set_project(&mut self, name: &str) -> Result<()>;

    /// Set the request timeout. Zero means no timeout.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Register an additional shard that must receive every write.
    fn add_server(&mut self, target: &ServerTarget) -> Result<()>;

    /// Targets currently receiving writes, primary first.
    fn servers(&self) -> Vec<ServerTarget>;
}

/// An open connection to a search (query) server.
pub trait SearchConnection: Send {
    /// Bind the connection to a project.
    fn set_project(&mut self, name: &str) -> Result<()>;

    /// Set the request timeout. Zero means no timeout.
    fn set_timeout(&mut self, timeout: Duration) -> Result<()>;

    /// Set the charset used for query and result text.
    fn set_charset(&mut self, charset: &str) -> Result<()>;
}

/// An open connection to the tokenizer service.
pub trait TokenizerConnection: Send {
    /// The server this tokenizer talks to.
    fn target(&self) -> &ServerTarget;
}
