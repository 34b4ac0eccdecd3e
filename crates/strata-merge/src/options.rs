use serde::{Deserialize, Serialize};
use strata_grammar::symbols::validate_symbol;
use strata_types::DEFAULT_SEPARATOR;

use crate::error::{ConfigError, ConfigResult};

/// Construction options for a [`Configuration`](crate::Configuration).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOptions {
    /// Character joining path segments in textual paths (`group.two`).
    /// Word characters are rejected: they would split key names.
    pub separator: char,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl ConfigOptions {
    pub fn with_separator(separator: char) -> Self {
        Self { separator }
    }

    /// Check that the separator can never occur inside a key name.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_symbol(self.separator).map_err(|err| ConfigError::InvalidSeparator {
            separator: self.separator,
            reason: err.to_string(),
        })
    }
}
