//! Operator symbol validation.
//!
//! Valid symbols:
//! - Must be a single character
//! - Must not be alphanumeric or `_` (those belong to the true key)
//! - Must not be whitespace or a control character

use std::fmt;

use crate::error::{GrammarError, GrammarResult};

/// Which table a registered symbol belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Action,
    Modifier,
    Lock,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Action => "an action",
            Self::Modifier => "a modifier",
            Self::Lock => "the lock symbol",
        })
    }
}

/// Validate an operator symbol, returning `Ok(())` if it can prefix a key.
///
/// # Examples
///
/// ```
/// use strata_grammar::symbols::validate_symbol;
///
/// assert!(validate_symbol('$').is_ok());
/// assert!(validate_symbol('a').is_err());
/// assert!(validate_symbol('_').is_err());
/// ```
pub fn validate_symbol(symbol: char) -> GrammarResult<()> {
    if symbol.is_alphanumeric() || symbol == '_' {
        return Err(GrammarError::InvalidSymbol {
            symbol,
            reason: "word characters are reserved for key names".into(),
        });
    }
    if symbol.is_whitespace() || symbol.is_control() {
        return Err(GrammarError::InvalidSymbol {
            symbol,
            reason: "whitespace and control characters are not allowed".into(),
        });
    }
    Ok(())
}
