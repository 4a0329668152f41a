//! Error types for the library surface.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the analysis engine and scanner.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parser failure: {0}")]
    Parser(String),

    #[error("unsupported file extension: {0}")]
    UnsupportedLanguage(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
