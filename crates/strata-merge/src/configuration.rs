//! The [`Configuration`] facade: one resolved tree plus its provenance,
//! locks, and operator dialect.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use strata_grammar::{Action, KeyGrammar, Modifier, OperatorRegistry};
use strata_types::{is_branch, tree, KeyPath, SourceId, Tree};

use crate::cache::ConfigCache;
use crate::engine::MergeEngine;
use crate::error::{ConfigError, ConfigResult};
use crate::locks::LockTable;
use crate::options::ConfigOptions;
use crate::provenance::ProvenanceIndex;

/// Where the value(s) at a path came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLookup {
    /// A leaf: its contributors, oldest first. Empty for leaves written
    /// with [`Configuration::set`].
    Leaf(Vec<SourceId>),
    /// A branch: the deduplicated contributors of every leaf beneath it.
    Branch(Vec<SourceId>),
}

impl SourceLookup {
    pub fn sources(&self) -> &[SourceId] {
        match self {
            Self::Leaf(sources) | Self::Branch(sources) => sources,
        }
    }

    pub fn contains(&self, source: &SourceId) -> bool {
        self.sources().contains(source)
    }

    /// The most recent contributor of a leaf.
    pub fn latest(&self) -> Option<&SourceId> {
        match self {
            Self::Leaf(sources) => sources.last(),
            Self::Branch(_) => None,
        }
    }
}

/// A layered configuration.
///
/// Layers are merged in order with [`Configuration::merge`]; later layers
/// override earlier ones leaf by leaf, unless a key's operator prefix asks
/// for something else (see [`strata_grammar`]). Every leaf remembers which
/// layers touched it.
///
/// Merges are not transactional over values: when a merge fails part way,
/// writes already applied stay in place. Only the locks it requested are
/// rolled back.
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    data: Tree,
    options: ConfigOptions,
    registry: OperatorRegistry,
    grammar: Option<KeyGrammar>,
    provenance: ProvenanceIndex,
    locks: LockTable,
    merge_count: u64,
}

impl Configuration {
    /// An empty configuration with the default dialect and separator.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigOptions) -> ConfigResult<Self> {
        Self::with_registry(OperatorRegistry::default(), options)
    }

    /// An empty configuration speaking the dialect defined by `registry`.
    ///
    /// Fails if the separator in `options` could appear inside a key name.
    pub fn with_registry(registry: OperatorRegistry, options: ConfigOptions) -> ConfigResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            registry,
            ..Self::default()
        })
    }

    /// A configuration seeded with one layer. An empty layer is not merged
    /// and consumes no ordinal.
    pub fn seeded(layer: &Tree, name: Option<SourceId>) -> ConfigResult<Self> {
        Self::new().with_layer(layer, name)
    }

    /// Builder form of [`Self::seeded`] for configurations with custom
    /// options or dialect.
    pub fn with_layer(mut self, layer: &Tree, name: Option<SourceId>) -> ConfigResult<Self> {
        if !layer.is_empty() {
            self.merge(layer, name)?;
        }
        Ok(self)
    }

    /// Merge `layers` in order into a fresh configuration.
    pub fn from_layers<I>(layers: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (Tree, Option<SourceId>)>,
    {
        let mut config = Self::new();
        for (layer, name) in layers {
            config.merge(&layer, name)?;
        }
        Ok(config)
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    // ---------------------------------------------------------------
    // Reads and writes
    // ---------------------------------------------------------------

    /// The value at `path`.
    pub fn get(&self, path: &str) -> ConfigResult<&Value> {
        let key_path = self.parse_path(path)?;
        tree::lookup(&self.data, &key_path).ok_or_else(|| not_found(path))
    }

    /// Overwrite a single key. Parents must already exist.
    ///
    /// Direct writes are not attributed to any source; they only keep the
    /// provenance index consistent when a branch becomes a leaf or back.
    /// Replacing a branch, or writing a branch, fails while any path
    /// beneath it is locked.
    pub fn set(&mut self, path: &str, value: Value) -> ConfigResult<()> {
        let key_path = self.parse_path(path)?;
        self.ensure_writable(&key_path)?;
        let key = key_path.last().ok_or_else(|| not_found(path))?.to_string();
        let branch = tree::parent_branch_mut(&mut self.data, &key_path)
            .ok_or_else(|| not_found(path))?;

        let replaces_node = branch.get(&key).is_some_and(is_branch) || is_branch(&value);
        if replaces_node {
            if let Some(lock) = self.locks.locks_under(&key_path).next() {
                return Err(ConfigError::LockedKey {
                    path: path.to_string(),
                    lock: lock.render(self.options.separator),
                });
            }
        }
        branch.insert(key, value);
        if replaces_node {
            self.provenance.purge_under(&key_path);
        }
        Ok(())
    }

    /// Merge one layer, attributing its writes to `name` or, when absent,
    /// to the ordinal of this merge.
    ///
    /// Fails with [`ConfigError::Grammar`] on a malformed key,
    /// [`ConfigError::LockedKey`] on a write to a locked path, and
    /// [`ConfigError::Action`] when an action rejects its operands. Locks
    /// requested by a failed merge are discarded.
    ///
    /// A failed merge consumes no ordinal. Writes it left in place are
    /// credited to that ordinal, which the next unnamed merge reuses; name
    /// layers when attribution after a failure matters.
    pub fn merge(&mut self, layer: &Tree, name: Option<SourceId>) -> ConfigResult<()> {
        let grammar = match self.grammar.take() {
            Some(grammar) if grammar.is_current(&self.registry) => grammar,
            _ => KeyGrammar::compile(&self.registry)?,
        };
        let source = name.unwrap_or(SourceId::Ordinal(self.merge_count));
        debug!(%source, keys = layer.len(), "merging layer");

        let outcome = MergeEngine {
            registry: &self.registry,
            grammar: &grammar,
            provenance: &mut self.provenance,
            locks: &mut self.locks,
            source: &source,
            separator: self.options.separator,
        }
        .run(layer, &mut self.data);
        self.grammar = Some(grammar);

        match outcome {
            Ok(()) => {
                let committed = self.locks.commit();
                debug!(%source, locks = committed, "merge complete");
                self.provenance.note_merge(source);
                self.merge_count += 1;
                Ok(())
            }
            Err(err) => {
                let discarded = self.locks.discard();
                warn!(%source, error = %err, discarded_locks = discarded, "merge aborted");
                Err(err)
            }
        }
    }

    /// A deep copy of the tree. With `keep_locks`, every key that holds a
    /// lock is prefixed with the lock symbol.
    pub fn as_dict(&self, keep_locks: bool) -> Tree {
        if !keep_locks {
            return self.data.clone();
        }
        self.annotate_locks(self.data.clone(), &KeyPath::root())
    }

    fn annotate_locks(&self, branch: Tree, prefix: &KeyPath) -> Tree {
        let symbol = self.registry.lock_symbol();
        branch
            .into_iter()
            .map(|(key, value)| {
                let path = prefix.child(key.as_str());
                let value = match value {
                    Value::Object(child) => Value::Object(self.annotate_locks(child, &path)),
                    leaf => leaf,
                };
                let key = if self.locks.holds_lock(&path) {
                    format!("{symbol}{key}")
                } else {
                    key
                };
                (key, value)
            })
            .collect()
    }

    // ---------------------------------------------------------------
    // Provenance
    // ---------------------------------------------------------------

    /// Contributors of the node at `path`.
    pub fn source(&self, path: &str) -> ConfigResult<SourceLookup> {
        let key_path = self.parse_path(path)?;
        let node = tree::lookup(&self.data, &key_path).ok_or_else(|| not_found(path))?;
        if node.is_object() {
            return Ok(SourceLookup::Branch(self.provenance.sources_under(&key_path)));
        }
        let history = self.provenance.history(&key_path).unwrap_or_default();
        Ok(SourceLookup::Leaf(history.to_vec()))
    }

    /// The most recent contributor of the leaf at `path`.
    pub fn source_of(&self, path: &str) -> ConfigResult<&SourceId> {
        let key_path = self.parse_path(path)?;
        self.provenance
            .latest(&key_path)
            .ok_or_else(|| not_found(path))
    }

    /// Deduplicated contributors of every leaf at or beneath `path`.
    pub fn sources_under(&self, path: &str) -> ConfigResult<Vec<SourceId>> {
        let key_path = self.parse_path(path)?;
        tree::lookup(&self.data, &key_path).ok_or_else(|| not_found(path))?;
        Ok(self.provenance.sources_under(&key_path))
    }

    /// Full contributor history of the leaf at `path`, oldest first.
    pub fn provenance(&self, path: &str) -> ConfigResult<&[SourceId]> {
        let key_path = self.parse_path(path)?;
        self.provenance
            .history(&key_path)
            .ok_or_else(|| not_found(path))
    }

    /// Every source ever merged, mapped to the leaf paths it contributed
    /// to. Sources that were fully overridden map to an empty list.
    pub fn sources(&self) -> BTreeMap<SourceId, Vec<String>> {
        let separator = self.options.separator;
        self.provenance
            .sources_by_key()
            .into_iter()
            .map(|(source, paths)| {
                let rendered = paths.iter().map(|p| p.render(separator)).collect();
                (source, rendered)
            })
            .collect()
    }

    /// Identifiers of completed merges, in order.
    pub fn merge_order(&self) -> &[SourceId] {
        self.provenance.merge_order()
    }

    /// Number of completed merges; also the next default ordinal.
    pub fn merge_count(&self) -> u64 {
        self.merge_count
    }

    /// Every leaf path with recorded provenance.
    pub fn leaf_paths(&self) -> Vec<String> {
        let separator = self.options.separator;
        self.provenance
            .leaf_paths()
            .map(|p| p.render(separator))
            .collect()
    }

    // ---------------------------------------------------------------
    // Locks
    // ---------------------------------------------------------------

    /// Returns `true` if `path` or any ancestor is locked.
    pub fn is_locked(&self, path: &str) -> ConfigResult<bool> {
        let key_path = self.parse_path(path)?;
        Ok(self.locks.is_locked(&key_path))
    }

    /// Lock `path` immediately. The path need not exist yet.
    pub fn lock_key(&mut self, path: &str) -> ConfigResult<()> {
        let key_path = self.parse_path(path)?;
        debug!(path, "locked key");
        self.locks.lock(key_path);
        Ok(())
    }

    /// Every active lock, rendered.
    pub fn locked(&self) -> Vec<String> {
        let separator = self.options.separator;
        self.locks.active().map(|p| p.render(separator)).collect()
    }

    fn ensure_writable(&self, path: &KeyPath) -> ConfigResult<()> {
        match self.locks.locking_prefix(path) {
            Some(lock) => Err(ConfigError::LockedKey {
                path: path.render(self.options.separator),
                lock: lock.render(self.options.separator),
            }),
            None => Ok(()),
        }
    }

    // ---------------------------------------------------------------
    // Dialect
    // ---------------------------------------------------------------

    /// Register a custom action. See [`OperatorRegistry::register_action`].
    pub fn register_action(
        &mut self,
        symbol: char,
        action: Action,
        force: bool,
        index: Option<usize>,
    ) -> ConfigResult<()> {
        Ok(self.registry.register_action(symbol, action, force, index)?)
    }

    /// Register a custom modifier. See
    /// [`OperatorRegistry::register_modifier`].
    pub fn register_modifier(
        &mut self,
        symbol: char,
        modifier: Modifier,
        force: bool,
        index: Option<usize>,
    ) -> ConfigResult<()> {
        Ok(self.registry.register_modifier(symbol, modifier, force, index)?)
    }

    pub fn set_ordering(&mut self, ordering: impl IntoIterator<Item = char>) {
        self.registry.set_ordering(ordering);
    }

    // ---------------------------------------------------------------
    // Caching
    // ---------------------------------------------------------------

    /// Store a snapshot of this configuration in `cache` under `name`.
    pub fn cache(&self, cache: &ConfigCache, name: &str) -> ConfigResult<()> {
        cache.insert(name, self.clone())?;
        Ok(())
    }

    fn parse_path(&self, path: &str) -> ConfigResult<KeyPath> {
        Ok(KeyPath::parse(path, self.options.separator)?)
    }
}

fn not_found(path: &str) -> ConfigError {
    ConfigError::KeyNotFound {
        path: path.to_string(),
    }
}
