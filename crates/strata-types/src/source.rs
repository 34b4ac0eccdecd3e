use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the layer that contributed a value.
///
/// Callers either name a layer explicitly or let the configuration assign
/// the ordinal of the merge call. Both forms share one namespace, so a
/// layer named `"0"` and ordinal `0` are distinct identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    /// Default identifier: the number of merges completed before this one.
    Ordinal(u64),
    /// Caller-supplied identifier, e.g. a file path.
    Named(String),
}

impl SourceId {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinal(n) => write!(f, "#{n}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for SourceId {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for SourceId {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<u64> for SourceId {
    fn from(ordinal: u64) -> Self {
        Self::Ordinal(ordinal)
    }
}
