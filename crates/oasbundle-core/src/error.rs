//! Error types for the bundler core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for the bundler core
pub type Result<T> = std::result::Result<T, Error>;

/// Bundler core errors
#[derive(Error, Debug)]
pub enum Error {
    /// YAML (or JSON, a YAML subset) document failed to parse
    #[error("parse error in {path}: {message}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Underlying message
        message: String,
    },

    /// A referenced file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A `$ref` pointer did not resolve to anything
    #[error("unresolved reference {file}#{pointer}")]
    UnresolvedRef {
        /// File the reference pointed into
        file: String,
        /// Pointer inside that file
        pointer: String,
    },

    /// `AddPath`/`SetPath` encountered a tree shape incompatible with the requested operation
    #[error("path type mismatch: {0}")]
    PathTypeMismatch(String),

    /// `Append` found a key that already exists in the destination mapping
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A `$ref` string could not be used as a cross-file reference
    #[error("invalid $ref: {0}")]
    InvalidRef(String),
}

impl Error {
    /// Build an [`Error::Io`] from a path and the underlying `io::Error`
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an [`Error::Parse`] from a path and a message
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
