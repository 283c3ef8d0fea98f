//! Common error types

use thiserror::Error;

/// Common result type for scape operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across the workspace crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed value in a file or string being parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
