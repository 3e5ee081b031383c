//! Error types for DrDocer.
//!
//! Library crates use [`DrDocerError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all DrDocer operations.
#[derive(Debug, thiserror::Error)]
pub enum DrDocerError {
    /// A required configuration section was absent at construction.
    #[error("missing configuration: {0}")]
    NilConfig(String),

    /// A required entity source was absent or unknown at construction.
    #[error("missing entity source: {0}")]
    NilSource(String),

    /// Entity is missing an identity field or is otherwise unusable.
    #[error("invalid entity: {message}")]
    InvalidEntity { message: String },

    /// Attribute value's type disagrees with its schema.
    #[error("type mismatch for attribute {attribute}: expected {expected}, got {actual}")]
    TypeMismatch {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Attribute was already initialised through the single-set path.
    #[error("attribute {attribute} already set on entity {entity}")]
    AlreadySet { attribute: String, entity: String },

    /// Relationship lookup for a name the store has never seen.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// A registered entity source failed; the load was aborted.
    #[error("entity source {source_name} failed: {error}")]
    SourceFailure {
        source_name: String,
        error: Box<DrDocerError>,
    },

    /// Attribute name not present in the registry.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// YAML or front-matter decoding error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Relationship or document storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Template loading or rendering error.
    #[error("template error: {0}")]
    Template(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, bad registry entry, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DrDocerError>;

impl DrDocerError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an invalid-entity error from any displayable message.
    pub fn invalid_entity(msg: impl Into<String>) -> Self {
        Self::InvalidEntity {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap an error returned by an entity source.
    pub fn source_failure(source_name: impl Into<String>, error: DrDocerError) -> Self {
        Self::SourceFailure {
            source_name: source_name.into(),
            error: Box::new(error),
        }
    }
}
