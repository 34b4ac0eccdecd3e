use std::path::PathBuf;

use thiserror::Error;

use strata_merge::ConfigError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("unsupported layer format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("top level of {path} is not a table")]
    NotAnObject { path: PathBuf },

    #[error("environment variable not set: {0}")]
    EnvNotSet(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type LoadResult<T> = Result<T, LoadError>;
