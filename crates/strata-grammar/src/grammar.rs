//! Key grammar: decomposes a raw merge key into its operator prefix and
//! true key.
//!
//! ```text
//! [modifier symbols*][action symbol?][lock symbol?]identifier
//! ```
//!
//! The identifier is a non-empty run of word characters. The pattern is
//! compiled from a registry snapshot and must be recompiled whenever the
//! registry's symbol sets change; [`KeyGrammar::is_current`] tells callers
//! when that is needed.

use regex::Regex;
use tracing::debug;

use crate::error::{GrammarError, GrammarResult};
use crate::registry::OperatorRegistry;

/// One raw key split into its structural parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeparatedKey {
    /// The key exactly as it appeared in the layer.
    pub raw: String,
    /// Modifier symbols in the order they were written.
    pub modifiers: Vec<char>,
    /// The action symbol, if any.
    pub action: Option<char>,
    /// Whether the lock symbol was present.
    pub lock: bool,
    /// The key with every symbol stripped.
    pub true_key: String,
}

/// A key pattern compiled against one registry generation.
#[derive(Clone, Debug)]
pub struct KeyGrammar {
    pattern: Regex,
    generation: u64,
}

impl KeyGrammar {
    /// Compile the key pattern for the registry's current symbol sets.
    pub fn compile(registry: &OperatorRegistry) -> GrammarResult<Self> {
        let mut source = String::from("^");
        let modifiers = escaped_class(registry.modifier_symbols());
        if !modifiers.is_empty() {
            source.push_str(&format!("(?P<modifiers>[{modifiers}]*)"));
        }
        let actions = escaped_class(registry.action_symbols());
        if !actions.is_empty() {
            source.push_str(&format!("(?P<action>[{actions}])?"));
        }
        let lock = regex::escape(&registry.lock_symbol().to_string());
        source.push_str(&format!("(?P<lock>{lock})?(?P<key>\\w+)$"));

        debug!(pattern = %source, generation = registry.generation(), "compiled key grammar");
        Ok(Self {
            pattern: Regex::new(&source)?,
            generation: registry.generation(),
        })
    }

    /// Returns `true` if this grammar was compiled from the registry's
    /// current symbol sets.
    pub fn is_current(&self, registry: &OperatorRegistry) -> bool {
        self.generation == registry.generation()
    }

    /// Split `raw` into a [`SeparatedKey`].
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_grammar::{KeyGrammar, OperatorRegistry};
    ///
    /// let grammar = KeyGrammar::compile(&OperatorRegistry::default()).unwrap();
    /// let key = grammar.parse("?+#list").unwrap();
    /// assert_eq!(key.modifiers, vec!['?']);
    /// assert_eq!(key.action, Some('+'));
    /// assert!(key.lock);
    /// assert_eq!(key.true_key, "list");
    /// assert!(grammar.parse("+-list").is_err());
    /// ```
    pub fn parse(&self, raw: &str) -> GrammarResult<SeparatedKey> {
        let caps = self
            .pattern
            .captures(raw)
            .ok_or_else(|| GrammarError::MalformedKey {
                key: raw.to_string(),
            })?;
        let modifiers = caps
            .name("modifiers")
            .map(|m| m.as_str().chars().collect())
            .unwrap_or_default();
        let action = caps
            .name("action")
            .and_then(|m| m.as_str().chars().next());
        let true_key = caps
            .name("key")
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| GrammarError::MalformedKey {
                key: raw.to_string(),
            })?;
        Ok(SeparatedKey {
            raw: raw.to_string(),
            modifiers,
            action,
            lock: caps.name("lock").is_some(),
            true_key,
        })
    }
}

fn escaped_class(symbols: impl Iterator<Item = char>) -> String {
    symbols.map(|s| regex::escape(&s.to_string())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::modifier::Modifier;

    fn grammar() -> KeyGrammar {
        KeyGrammar::compile(&OperatorRegistry::default()).unwrap()
    }

    #[test]
    fn plain_key() {
        let key = grammar().parse("timeout_ms").unwrap();
        assert!(key.modifiers.is_empty());
        assert_eq!(key.action, None);
        assert!(!key.lock);
        assert_eq!(key.true_key, "timeout_ms");
    }

    #[test]
    fn full_prefix() {
        let key = grammar().parse("!?-#value").unwrap();
        assert_eq!(key.modifiers, vec!['!', '?']);
        assert_eq!(key.action, Some('-'));
        assert!(key.lock);
        assert_eq!(key.true_key, "value");
        assert_eq!(key.raw, "!?-#value");
    }

    #[test]
    fn lock_only() {
        let key = grammar().parse("#list").unwrap();
        assert!(key.lock);
        assert!(key.action.is_none());
        assert!(key.modifiers.is_empty());
    }

    #[test]
    fn malformed_keys() {
        let g = grammar();
        for raw in ["", "+", "+-list", "+?list", "#+list", "list+", "li st", "$key", "a.b", "##a"] {
            let err = g.parse(raw).unwrap_err();
            assert!(matches!(err, GrammarError::MalformedKey { .. }), "{raw:?} should be malformed");
        }
    }

    #[test]
    fn recompile_after_registration() {
        let mut registry = OperatorRegistry::default();
        let stale = KeyGrammar::compile(&registry).unwrap();
        registry
            .register_action('$', Action::custom("noop", |_, v| Ok(v)), false, None)
            .unwrap();
        assert!(!stale.is_current(&registry));
        assert!(stale.parse("$key").is_err());

        let fresh = KeyGrammar::compile(&registry).unwrap();
        assert!(fresh.is_current(&registry));
        assert_eq!(fresh.parse("$key").unwrap().action, Some('$'));
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        let mut registry = OperatorRegistry::default();
        registry
            .register_modifier('^', Modifier::custom("always", |_| true), false, None)
            .unwrap();
        registry
            .register_modifier(']', Modifier::custom("never", |_| false), false, None)
            .unwrap();
        let g = KeyGrammar::compile(&registry).unwrap();
        assert_eq!(g.parse("^]+key").unwrap().modifiers, vec!['^', ']']);
    }

    #[test]
    fn bare_registry_parses_plain_and_lock() {
        let g = KeyGrammar::compile(&OperatorRegistry::bare()).unwrap();
        assert!(g.parse("key").is_ok());
        assert!(g.parse("#key").unwrap().lock);
        assert!(g.parse("+key").is_err());
    }
}
