//! The provenance index: which layers contributed to each leaf.
//!
//! [`ProvenanceIndex`] keeps, for every tracked leaf path, the ordered list
//! of source identifiers that modified it. It is a *derived* structure kept
//! in step with the tree by the merge engine.
//!
//! # Invariants
//!
//! - Every tracked path is a leaf in the tree.
//! - A history never holds the same identifier twice in a row.
//! - Entries sharing a prefix are contiguous in the map, so subtree
//!   queries are range scans.

use std::collections::BTreeMap;

use strata_types::{KeyPath, SourceId};

/// Per-leaf contributor histories plus the order layers were merged in.
#[derive(Clone, Debug, Default)]
pub struct ProvenanceIndex {
    entries: BTreeMap<KeyPath, Vec<SourceId>>,
    merge_order: Vec<SourceId>,
}

impl ProvenanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked leaves.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Append `source` to the history of `path` unless it is already last.
    pub fn record(&mut self, path: &KeyPath, source: &SourceId) {
        let history = self.entries.entry(path.clone()).or_default();
        if history.last() != Some(source) {
            history.push(source.clone());
        }
    }

    /// Forget the history of `path` so the next record starts fresh.
    pub fn reset(&mut self, path: &KeyPath) {
        self.entries.remove(path);
    }

    /// Drop every entry at or beneath `prefix`. Returns how many were
    /// removed.
    pub fn purge_under(&mut self, prefix: &KeyPath) -> usize {
        let doomed: Vec<KeyPath> = self.paths_under(prefix).cloned().collect();
        for path in &doomed {
            self.entries.remove(path);
        }
        doomed.len()
    }

    /// Note that a merge attributed to `source` completed.
    pub fn note_merge(&mut self, source: SourceId) {
        self.merge_order.push(source);
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Full contributor history of a leaf, oldest first.
    pub fn history(&self, path: &KeyPath) -> Option<&[SourceId]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// The most recent contributor of a leaf.
    pub fn latest(&self, path: &KeyPath) -> Option<&SourceId> {
        self.entries.get(path).and_then(|h| h.last())
    }

    /// Deduplicated contributors of every leaf at or beneath `prefix`, in
    /// order of first appearance.
    pub fn sources_under(&self, prefix: &KeyPath) -> Vec<SourceId> {
        let mut out: Vec<SourceId> = Vec::new();
        for history in self.range_under(prefix).map(|(_, h)| h) {
            for source in history {
                if !out.contains(source) {
                    out.push(source.clone());
                }
            }
        }
        out
    }

    /// Invert the index: every merged source mapped to the leaves it
    /// contributed to. Sources that no longer contribute map to an empty
    /// list.
    pub fn sources_by_key(&self) -> BTreeMap<SourceId, Vec<KeyPath>> {
        let mut out: BTreeMap<SourceId, Vec<KeyPath>> = self
            .merge_order
            .iter()
            .map(|source| (source.clone(), Vec::new()))
            .collect();
        for (path, history) in &self.entries {
            for source in history {
                let paths = out.entry(source.clone()).or_default();
                if paths.last() != Some(path) {
                    paths.push(path.clone());
                }
            }
        }
        out
    }

    /// Identifiers of completed merges, in merge order.
    pub fn merge_order(&self) -> &[SourceId] {
        &self.merge_order
    }

    /// Every tracked leaf path in sorted order.
    pub fn leaf_paths(&self) -> impl Iterator<Item = &KeyPath> {
        self.entries.keys()
    }

    fn paths_under<'a>(&'a self, prefix: &'a KeyPath) -> impl Iterator<Item = &'a KeyPath> + 'a {
        self.range_under(prefix).map(|(path, _)| path)
    }

    fn range_under<'a>(
        &'a self,
        prefix: &'a KeyPath,
    ) -> impl Iterator<Item = (&'a KeyPath, &'a Vec<SourceId>)> + 'a {
        self.entries
            .range(prefix.clone()..)
            .take_while(move |(path, _)| path.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> KeyPath {
        KeyPath::parse(raw, '.').unwrap()
    }

    fn src(name: &str) -> SourceId {
        SourceId::named(name)
    }

    #[test]
    fn record_skips_repeated_tail() {
        let mut index = ProvenanceIndex::new();
        index.record(&path("a"), &src("one"));
        index.record(&path("a"), &src("one"));
        index.record(&path("a"), &src("two"));
        index.record(&path("a"), &src("one"));
        assert_eq!(index.history(&path("a")).unwrap(), &[src("one"), src("two"), src("one")]);
        assert_eq!(index.latest(&path("a")), Some(&src("one")));
    }

    #[test]
    fn reset_starts_fresh() {
        let mut index = ProvenanceIndex::new();
        index.record(&path("a"), &src("one"));
        index.reset(&path("a"));
        index.record(&path("a"), &src("two"));
        assert_eq!(index.history(&path("a")).unwrap(), &[src("two")]);
    }

    #[test]
    fn purge_is_segment_aware() {
        let mut index = ProvenanceIndex::new();
        index.record(&path("g.a"), &src("one"));
        index.record(&path("g.b.c"), &src("one"));
        index.record(&path("gg"), &src("one"));
        index.record(&path("g2.a"), &src("one"));
        assert_eq!(index.purge_under(&path("g")), 2);
        let left: Vec<String> = index.leaf_paths().map(|p| p.render('.')).collect();
        assert_eq!(left, vec!["g2.a", "gg"]);
    }

    #[test]
    fn sources_under_dedups_in_first_seen_order() {
        let mut index = ProvenanceIndex::new();
        index.record(&path("g.a"), &src("two"));
        index.record(&path("g.b"), &src("one"));
        index.record(&path("g.b"), &src("two"));
        index.record(&path("other"), &src("three"));
        assert_eq!(index.sources_under(&path("g")), vec![src("two"), src("one")]);
    }

    #[test]
    fn inversion_keeps_silent_sources() {
        let mut index = ProvenanceIndex::new();
        index.record(&path("a"), &src("one"));
        index.note_merge(src("one"));
        index.note_merge(src("ghost"));
        let by_key = index.sources_by_key();
        assert_eq!(by_key[&src("one")], vec![path("a")]);
        assert!(by_key[&src("ghost")].is_empty());
    }

    #[test]
    fn inversion_lists_path_once_per_source() {
        let mut index = ProvenanceIndex::new();
        index.record(&path("a"), &src("one"));
        index.record(&path("a"), &src("two"));
        index.record(&path("a"), &src("one"));
        let by_key = index.sources_by_key();
        assert_eq!(by_key[&src("one")], vec![path("a")]);
        assert_eq!(by_key[&src("two")], vec![path("a")]);
    }
}
