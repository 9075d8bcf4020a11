//! Common error types for clipscan

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for clipscan operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across clipscan crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML file could not be decoded
    #[error("Failed to parse TOML config {path}: {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
