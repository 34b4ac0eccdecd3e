//! Gating modifiers: predicates that can suppress an operation on a key.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Everything a modifier may inspect about the pending operation.
#[derive(Clone, Copy, Debug)]
pub struct OperationContext<'a> {
    /// The action symbol on the key, if any.
    pub action: Option<char>,
    /// The true key (symbols stripped).
    pub key: &'a str,
    /// The value currently in the tree; `None` when absent or `null`.
    pub existing: Option<&'a Value>,
    /// The value carried by the layer being merged.
    pub incoming: &'a Value,
}

/// Signature of a caller-registered modifier.
pub type ModifierFn = dyn Fn(&OperationContext<'_>) -> bool + Send + Sync;

/// A gating modifier bound to a symbol in the operator registry.
#[derive(Clone)]
pub enum Modifier {
    /// `?`: proceed only when a value already exists.
    Exists,
    /// `!`: proceed only when no value exists yet.
    NotExists,
    /// Domain-specific predicate supplied by the embedding application.
    Custom { name: String, func: Arc<ModifierFn> },
}

impl Modifier {
    /// Wrap a closure as a custom modifier.
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&OperationContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Exists => "exists",
            Self::NotExists => "not-exists",
            Self::Custom { name, .. } => name,
        }
    }

    /// Returns `true` if the operation may proceed.
    pub fn allows(&self, context: &OperationContext<'_>) -> bool {
        match self {
            Self::Exists => context.existing.is_some(),
            Self::NotExists => context.existing.is_none(),
            Self::Custom { func, .. } => func(context),
        }
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
            builtin => f.write_str(builtin.name()),
        }
    }
}
