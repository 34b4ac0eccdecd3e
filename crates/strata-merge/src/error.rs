//! Error types for the merge crate.

use strata_grammar::{ActionError, GrammarError};
use strata_types::TypeError;

/// Errors that can occur while reading, writing, or merging a
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The path does not resolve to a node in the tree.
    #[error("key not found: {path}")]
    KeyNotFound { path: String },

    /// The path, or one of its ancestors, is locked.
    #[error("key is locked: {path} (lock held on {lock})")]
    LockedKey { path: String, lock: String },

    /// A merge key was malformed or a symbol registration conflicted.
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// A merge action failed; passed through unchanged.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// The configured separator could appear inside a key name.
    #[error("invalid path separator {separator:?}: {reason}")]
    InvalidSeparator { separator: char, reason: String },

    /// The textual path could not be parsed.
    #[error(transparent)]
    Path(#[from] TypeError),

    /// The configuration cache lock was poisoned by a panicking writer.
    #[error("configuration cache poisoned: {0}")]
    CachePoisoned(String),
}

impl ConfigError {
    /// Returns `true` for [`ConfigError::LockedKey`].
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::LockedKey { .. })
    }

    /// Returns `true` for [`ConfigError::KeyNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }

    /// Returns `true` for a malformed merge key.
    pub fn is_malformed_key(&self) -> bool {
        matches!(self, Self::Grammar(GrammarError::MalformedKey { .. }))
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
