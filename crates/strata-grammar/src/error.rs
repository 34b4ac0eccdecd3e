//! Error types for the grammar crate.

use serde_json::Value;

use crate::symbols::SymbolKind;

/// Errors raised while parsing keys or editing the operator registry.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    /// A merge key does not match `[modifiers*][action?][lock?]identifier`.
    #[error("malformed key: {key:?}")]
    MalformedKey { key: String },

    /// The symbol is already registered and `force` was not given.
    #[error("symbol {symbol:?} is already registered as {existing}")]
    SymbolConflict { symbol: char, existing: SymbolKind },

    /// The symbol can never be used as an operator.
    #[error("invalid operator symbol {symbol:?}: {reason}")]
    InvalidSymbol { symbol: char, reason: String },

    /// The compiled key pattern was rejected by the regex engine.
    #[error("key pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Failures raised by merge actions.
///
/// These are surfaced to the caller unchanged; the engine does not try to
/// recover from a failing action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The action does not support this pair of value types.
    #[error("action '{action}' cannot combine {existing} with {incoming}")]
    TypeMismatch {
        action: char,
        existing: &'static str,
        incoming: &'static str,
    },

    /// Subtraction asked to remove an element the array does not hold.
    #[error("element {element} not present in array")]
    ElementNotFound { element: Value },

    /// Integer arithmetic overflowed.
    #[error("action '{action}' overflowed")]
    Overflow { action: char },

    /// Floating point arithmetic produced NaN or infinity.
    #[error("action '{action}' produced a non-finite number")]
    NonFinite { action: char },

    /// Raised by a caller-registered action.
    #[error("{0}")]
    Custom(String),
}

/// Convenience alias for grammar results.
pub type GrammarResult<T> = Result<T, GrammarError>;
