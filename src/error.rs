//! Error types for the `oasbundle` CLI

use thiserror::Error;

/// Result type alias for the CLI
pub type Result<T> = std::result::Result<T, Error>;

/// CLI-level errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Error bundling the document
    #[error(transparent)]
    Bundle(#[from] oasbundle_core::Error),

    /// IO error writing output or binding the server
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// `serve` subcommand error
    #[error("server error: {0}")]
    Server(String),
}
