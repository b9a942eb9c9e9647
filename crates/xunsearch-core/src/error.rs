//! Error types for xunsearch-core.

use std::fmt;

use thiserror::Error;

/// Result type alias for xunsearch-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation rule broken by a field scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeRule {
    /// No field declares the identifier role.
    MissingIdentifier,
    /// More than one field declares the identifier role.
    DuplicateIdentifier,
    /// More than one field declares the title role.
    DuplicateTitle,
    /// More than one field declares the body role.
    DuplicateBody,
    /// Two fields share a name.
    DuplicateName,
}

impl fmt::Display for SchemeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentifier => write!(f, "missing identifier field"),
            Self::DuplicateIdentifier => write!(f, "duplicate identifier field"),
            Self::DuplicateTitle => write!(f, "duplicate title field"),
            Self::DuplicateBody => write!(f, "duplicate body field"),
            Self::DuplicateName => write!(f, "duplicate field name"),
        }
    }
}

/// Errors that can occur in xunsearch-core.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A configuration source could not be read or produced nothing usable.
    ///
    /// Malformed ini text is tolerated line by line, so a file that parses
    /// to nothing is reported here too.
    #[error("Failed to load project config '{source_id}': {message}")]
    ConfigLoad {
        /// Identifier of the source (usually a path)
        source_id: String,
        /// What went wrong
        message: String,
        /// Underlying I/O failure, if any
        #[source]
        io: Option<std::io::Error>,
    },

    /// A field scheme broke one of its validation rules.
    #[error("Invalid field scheme ({rule}): {message}")]
    SchemeInvalid {
        /// The rule that was broken
        rule: SchemeRule,
        /// Details, usually naming the offending fields
        message: String,
    },

    /// Strict field lookup found nothing.
    #[error("Field not found: {field}")]
    FieldNotFound {
        /// Name or index that was requested
        field: String,
    },

    /// No transcoder is available for the requested charset.
    #[error("Unsupported charset: {charset}")]
    UnsupportedCharset {
        /// The charset label that could not be handled
        charset: String,
    },

    /// Cache store failure.
    #[error("Cache error: {message}")]
    Cache {
        /// What went wrong
        message: String,
    },
}

impl Error {
    /// Creates a config load error without an underlying I/O cause.
    pub fn config_load<I, M>(source_id: I, message: M) -> Self
    where
        I: Into<String>,
        M: Into<String>,
    {
        Error::ConfigLoad {
            source_id: source_id.into(),
            message: message.into(),
            io: None,
        }
    }

    /// Creates a config load error caused by an I/O failure.
    pub fn config_io<I: Into<String>>(source_id: I, io: std::io::Error) -> Self {
        Error::ConfigLoad {
            source_id: source_id.into(),
            message: io.to_string(),
            io: Some(io),
        }
    }

    /// Creates a scheme validation error.
    pub fn scheme<M: Into<String>>(rule: SchemeRule, message: M) -> Self {
        Error::SchemeInvalid {
            rule,
            message: message.into(),
        }
    }

    /// Creates a field-not-found error.
    pub fn field_not_found<S: fmt::Display>(field: S) -> Self {
        Error::FieldNotFound {
            field: field.to_string(),
        }
    }

    /// Creates an unsupported charset error.
    pub fn unsupported_charset<S: Into<String>>(charset: S) -> Self {
        Error::UnsupportedCharset {
            charset: charset.into(),
        }
    }

    /// Creates a cache error.
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Error::Cache {
            message: message.into(),
        }
    }

    /// Returns the violated rule if this is a scheme validation error.
    pub fn scheme_rule(&self) -> Option<SchemeRule> {
        match self {
            Error::SchemeInvalid { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}
