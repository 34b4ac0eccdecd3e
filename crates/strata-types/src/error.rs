use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid key path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
}
