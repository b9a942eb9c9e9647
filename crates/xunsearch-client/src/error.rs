//! Error types for xunsearch-client.

use thiserror::Error;

/// Result type alias for xunsearch-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in xunsearch-client.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from xunsearch-core (config, scheme, charset).
    #[error("Core error: {0}")]
    Core(#[from] xunsearch_core::Error),

    /// A backend target could not be reached or rejected a setup call.
    #[error("Connection to '{target}' failed: {message}")]
    Connection {
        /// The target that failed
        target: String,
        /// What went wrong
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Client settings are incomplete or inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// What is missing or wrong
        message: String,
    },

    /// An operation needed the active project but none was set.
    #[error("No active project")]
    NoActiveProject,

    /// A field accessor was used before any project scheme was loaded.
    #[error("No field scheme loaded for the active project")]
    NoScheme,

    /// Settings file could not be parsed.
    #[error("Settings error: {0}")]
    Settings(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a connection error.
    pub fn connection<T, M>(target: T, message: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Error::Connection {
            target: target.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection error with an underlying cause.
    pub fn connection_with_source<T, E>(target: T, source: E) -> Self
    where
        T: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Connection {
            target: target.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Whether this is a single-target connection failure.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// The target named by a connection error.
    pub fn target(&self) -> Option<&str> {
        match self {
            Error::Connection { target, .. } => Some(target),
            _ => None,
        }
    }
}
