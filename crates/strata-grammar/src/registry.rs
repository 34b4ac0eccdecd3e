//! The operator registry: symbol tables for actions and modifiers, the
//! lock symbol, and the resolution ordering.
//!
//! A registry is a plain value owned by one configuration. Sharing a
//! dialect between configurations means cloning the same registry into
//! each of them; custom operators are reference counted, so clones are
//! cheap.

use std::collections::BTreeMap;

use tracing::debug;

use crate::action::Action;
use crate::error::{GrammarError, GrammarResult};
use crate::grammar::SeparatedKey;
use crate::modifier::Modifier;
use crate::symbols::{validate_symbol, SymbolKind};

/// Lock symbol used by [`OperatorRegistry::default`].
pub const DEFAULT_LOCK_SYMBOL: char = '#';

/// Resolution order used by [`OperatorRegistry::default`].
pub const DEFAULT_ORDERING: &[char] = &['+', '-', '=', '!', '?'];

/// Symbol tables and ordering that drive the merge engine.
#[derive(Clone, Debug)]
pub struct OperatorRegistry {
    actions: BTreeMap<char, Action>,
    modifiers: BTreeMap<char, Modifier>,
    ordering: Vec<char>,
    lock_symbol: char,
    /// Bumped whenever the symbol sets change, so compiled grammars can
    /// tell they are stale.
    generation: u64,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        let mut actions = BTreeMap::new();
        actions.insert('+', Action::Add);
        actions.insert('-', Action::Subtract);
        actions.insert('=', Action::Copy);

        let mut modifiers = BTreeMap::new();
        modifiers.insert('!', Modifier::NotExists);
        modifiers.insert('?', Modifier::Exists);

        Self {
            actions,
            modifiers,
            ordering: DEFAULT_ORDERING.to_vec(),
            lock_symbol: DEFAULT_LOCK_SYMBOL,
            generation: 0,
        }
    }
}

impl OperatorRegistry {
    /// A registry with no actions or modifiers; only plain and lock keys
    /// parse against it.
    pub fn bare() -> Self {
        Self {
            actions: BTreeMap::new(),
            modifiers: BTreeMap::new(),
            ordering: Vec::new(),
            lock_symbol: DEFAULT_LOCK_SYMBOL,
            generation: 0,
        }
    }

    /// Replace the lock symbol.
    pub fn with_lock_symbol(mut self, symbol: char) -> GrammarResult<Self> {
        validate_symbol(symbol)?;
        if let Some(existing) = self.kind_of(symbol).filter(|k| *k != SymbolKind::Lock) {
            return Err(GrammarError::SymbolConflict { symbol, existing });
        }
        self.lock_symbol = symbol;
        self.generation += 1;
        Ok(self)
    }

    /// Register `action` under `symbol`.
    ///
    /// Fails with [`GrammarError::SymbolConflict`] if the symbol is already
    /// in use and `force` is `false`. With `force`, any prior registration
    /// of the symbol is removed first. The lock symbol can never be
    /// replaced. `index` is the position in the ordering; `None` appends.
    pub fn register_action(
        &mut self,
        symbol: char,
        action: Action,
        force: bool,
        index: Option<usize>,
    ) -> GrammarResult<()> {
        self.claim(symbol, force, index)?;
        debug!(%symbol, action = action.name(), "registered action");
        self.actions.insert(symbol, action);
        Ok(())
    }

    /// Register `modifier` under `symbol`. Same rules as
    /// [`Self::register_action`].
    pub fn register_modifier(
        &mut self,
        symbol: char,
        modifier: Modifier,
        force: bool,
        index: Option<usize>,
    ) -> GrammarResult<()> {
        self.claim(symbol, force, index)?;
        debug!(%symbol, modifier = modifier.name(), "registered modifier");
        self.modifiers.insert(symbol, modifier);
        Ok(())
    }

    /// Replace the resolution ordering.
    pub fn set_ordering(&mut self, ordering: impl IntoIterator<Item = char>) {
        self.ordering = ordering.into_iter().collect();
    }

    /// Validate `symbol`, resolve conflicts, and reserve its ordering slot.
    /// Leaves the registry untouched on error.
    fn claim(&mut self, symbol: char, force: bool, index: Option<usize>) -> GrammarResult<()> {
        validate_symbol(symbol)?;
        match self.kind_of(symbol) {
            Some(SymbolKind::Lock) => {
                return Err(GrammarError::SymbolConflict {
                    symbol,
                    existing: SymbolKind::Lock,
                });
            }
            Some(existing) if !force => {
                return Err(GrammarError::SymbolConflict { symbol, existing });
            }
            Some(_) => {
                self.actions.remove(&symbol);
                self.modifiers.remove(&symbol);
                self.ordering.retain(|s| *s != symbol);
            }
            None => {}
        }
        let position = index.unwrap_or(self.ordering.len()).min(self.ordering.len());
        self.ordering.insert(position, symbol);
        self.generation += 1;
        Ok(())
    }

    /// Which table `symbol` currently belongs to.
    pub fn kind_of(&self, symbol: char) -> Option<SymbolKind> {
        if symbol == self.lock_symbol {
            Some(SymbolKind::Lock)
        } else if self.actions.contains_key(&symbol) {
            Some(SymbolKind::Action)
        } else if self.modifiers.contains_key(&symbol) {
            Some(SymbolKind::Modifier)
        } else {
            None
        }
    }

    pub fn action(&self, symbol: char) -> Option<&Action> {
        self.actions.get(&symbol)
    }

    pub fn modifier(&self, symbol: char) -> Option<&Modifier> {
        self.modifiers.get(&symbol)
    }

    pub fn action_symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.actions.keys().copied()
    }

    pub fn modifier_symbols(&self) -> impl Iterator<Item = char> + '_ {
        self.modifiers.keys().copied()
    }

    pub fn lock_symbol(&self) -> char {
        self.lock_symbol
    }

    pub fn ordering(&self) -> &[char] {
        &self.ordering
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position of `symbol` in the ordering. Symbols missing from the
    /// ordering run after every ordered symbol.
    pub fn rank(&self, symbol: char) -> usize {
        self.ordering
            .iter()
            .position(|s| *s == symbol)
            .unwrap_or(self.ordering.len())
    }

    /// Sort keys into processing order: by true key, then lock flag, then
    /// action rank (plain keys first), then modifier ranks.
    pub fn sort_keys(&self, keys: &mut [SeparatedKey]) {
        keys.sort_by_cached_key(|key| {
            (
                key.true_key.clone(),
                key.lock,
                key.action.map(|a| self.rank(a)),
                key.modifiers.iter().map(|m| self.rank(*m)).collect::<Vec<_>>(),
            )
        });
    }
}
