//! The recursive merge algorithm.
//!
//! For every key of a layer branch the engine parses the operator prefix,
//! orders the keys, checks locks, runs modifiers, applies the action, and
//! then either recurses into a nested branch or writes a leaf. Provenance
//! is updated for every leaf written; lock requests are staged in the
//! [`LockTable`] and committed by the caller once the whole merge succeeds.

use serde_json::Value;
use tracing::trace;

use strata_grammar::{GrammarError, KeyGrammar, OperationContext, OperatorRegistry, SeparatedKey};
use strata_types::{is_branch, tree, KeyPath, SourceId, Tree};

use crate::error::{ConfigError, ConfigResult};
use crate::locks::LockTable;
use crate::provenance::ProvenanceIndex;

/// One merge call's view of a configuration's state.
pub(crate) struct MergeEngine<'a> {
    pub registry: &'a OperatorRegistry,
    pub grammar: &'a KeyGrammar,
    pub provenance: &'a mut ProvenanceIndex,
    pub locks: &'a mut LockTable,
    pub source: &'a SourceId,
    pub separator: char,
}

impl MergeEngine<'_> {
    /// Merge `layer` into `dest`, the root of the tree.
    pub fn run(&mut self, layer: &Tree, dest: &mut Tree) -> ConfigResult<()> {
        self.merge_branch(layer, dest, &KeyPath::root(), false)
    }

    /// `incremental` is set beneath a key that carried an action, so that
    /// leaves rewritten there extend their history instead of resetting it.
    fn merge_branch(
        &mut self,
        layer: &Tree,
        dest: &mut Tree,
        path: &KeyPath,
        incremental: bool,
    ) -> ConfigResult<()> {
        let mut keys = layer
            .keys()
            .map(|raw| self.grammar.parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        self.registry.sort_keys(&mut keys);

        for key in keys {
            let full = path.child(key.true_key.as_str());
            if let Some(lock) = self.locks.locking_prefix(&full) {
                return Err(ConfigError::LockedKey {
                    path: full.render(self.separator),
                    lock: lock.render(self.separator),
                });
            }
            let Some(incoming) = layer.get(&key.raw) else {
                continue;
            };

            let existing = dest.get(&key.true_key).filter(|v| !v.is_null());
            if !self.modifiers_allow(&key, existing, incoming)? {
                trace!(key = %key.raw, path = %full.render(self.separator), "skipped by modifier");
                continue;
            }

            let value = match key.action {
                Some(symbol) => {
                    let action = self.registry.action(symbol).ok_or_else(|| malformed(&key))?;
                    action.apply(symbol, existing.cloned(), incoming.clone())?
                }
                None => incoming.clone(),
            };
            let incremental = incremental || key.action.is_some();
            let kept_branch =
                key.action.is_some() && is_branch(&value) && existing == Some(&value);

            match value {
                Value::Object(branch) if kept_branch => {
                    // The action left the branch as it was: credit its leaves
                    // without reparsing their names as keys.
                    for relative in tree::leaf_paths(&branch) {
                        self.provenance.record(&full.join(&relative), self.source);
                    }
                    trace!(key = %key.raw, path = %full.render(self.separator), "kept branch");
                }
                Value::Object(branch) => {
                    let slot = dest
                        .entry(key.true_key.clone())
                        .or_insert_with(|| Value::Object(Tree::new()));
                    if !is_branch(slot) {
                        // A leaf is becoming a branch.
                        self.provenance.purge_under(&full);
                        *slot = Value::Object(Tree::new());
                    }
                    if let Value::Object(child) = slot {
                        self.merge_branch(&branch, child, &full, incremental)?;
                    }
                }
                leaf => {
                    let replaces_branch = dest.get(&key.true_key).is_some_and(is_branch);
                    if replaces_branch {
                        self.ensure_no_locks_under(&full)?;
                        self.provenance.purge_under(&full);
                    } else if !incremental {
                        self.provenance.reset(&full);
                    }
                    trace!(key = %key.raw, path = %full.render(self.separator), "wrote leaf");
                    dest.insert(key.true_key.clone(), leaf);
                    self.provenance.record(&full, self.source);
                }
            }

            if key.lock {
                self.locks.stage(full);
            }
        }
        Ok(())
    }

    /// A leaf may not replace a branch that still holds locked paths.
    fn ensure_no_locks_under(&self, path: &KeyPath) -> ConfigResult<()> {
        match self.locks.locks_under(path).next() {
            Some(lock) => Err(ConfigError::LockedKey {
                path: path.render(self.separator),
                lock: lock.render(self.separator),
            }),
            None => Ok(()),
        }
    }

    fn modifiers_allow(
        &self,
        key: &SeparatedKey,
        existing: Option<&Value>,
        incoming: &Value,
    ) -> ConfigResult<bool> {
        let context = OperationContext {
            action: key.action,
            key: &key.true_key,
            existing,
            incoming,
        };
        for symbol in &key.modifiers {
            let modifier = self.registry.modifier(*symbol).ok_or_else(|| malformed(key))?;
            if !modifier.allows(&context) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// A symbol the grammar accepted but the registry no longer knows.
fn malformed(key: &SeparatedKey) -> ConfigError {
    ConfigError::Grammar(GrammarError::MalformedKey {
        key: key.raw.clone(),
    })
}
