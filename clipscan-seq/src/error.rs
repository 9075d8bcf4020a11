//! Error types for clipscan-seq
//!
//! A run either completes or aborts: malformed input and bad configuration
//! are surfaced before any output is written.

use crate::services::neighbor_parser::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Detection error type
#[derive(Debug, Error)]
pub enum DetectError {
    /// Input or output file could not be read/written
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed neighbor-set record
    #[error("Format error: {0}")]
    Format(#[from] ParseError),

    /// Rejected run parameter
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON rendering failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DetectError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for detection operations
pub type DetectResult<T> = Result<T, DetectError>;
