// Error types for configuration loading and the snapshot archive.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration could not be loaded. Always fatal: nothing runs on a bad config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("corrupt configuration file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Persistence failure in the archive.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cannot prepare database location: {0}")]
    Io(#[from] std::io::Error),

    #[error("counter {0} does not fit the archive's integer column")]
    CounterOutOfRange(u64),

    #[error("corrupt archive row: {0}")]
    Corrupt(String),
}
