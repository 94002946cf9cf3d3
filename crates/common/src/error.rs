//! Error types for QaBridge

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using QaBridge Error
pub type Result<T> = std::result::Result<T, Error>;

/// QaBridge error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error in {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
