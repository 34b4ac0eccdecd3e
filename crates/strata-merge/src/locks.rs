//! The lock table: paths that may no longer be written.
//!
//! A path is locked when it, or any of its ancestors, is in the active
//! set. Locks requested by a merge are staged as pending and only become
//! active when the whole merge succeeds.
//!
//! # Invariants
//!
//! - The active set only grows; there is no unlock.
//! - Pending locks never affect [`LockTable::is_locked`].

use std::collections::BTreeSet;

use strata_types::KeyPath;

/// Active and pending locks for one configuration.
#[derive(Clone, Debug, Default)]
pub struct LockTable {
    active: BTreeSet<KeyPath>,
    pending: BTreeSet<KeyPath>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `path` or any ancestor is actively locked.
    pub fn is_locked(&self, path: &KeyPath) -> bool {
        self.locking_prefix(path).is_some()
    }

    /// The longest active lock covering `path`.
    pub fn locking_prefix(&self, path: &KeyPath) -> Option<KeyPath> {
        path.ancestors().find(|prefix| self.active.contains(prefix))
    }

    /// Active locks strictly beneath `prefix`, in sorted order. Replacing
    /// the node at `prefix` would overwrite every one of them.
    pub fn locks_under<'a>(&'a self, prefix: &'a KeyPath) -> impl Iterator<Item = &'a KeyPath> + 'a {
        self.active
            .range(prefix.clone()..)
            .skip_while(move |path| *path == prefix)
            .take_while(move |path| path.starts_with(prefix))
    }

    /// Returns `true` if exactly `path` holds an active lock.
    pub fn holds_lock(&self, path: &KeyPath) -> bool {
        self.active.contains(path)
    }

    /// Lock `path` immediately, bypassing staging.
    pub fn lock(&mut self, path: KeyPath) {
        self.active.insert(path);
    }

    /// Stage `path` to be locked when the current merge commits.
    pub fn stage(&mut self, path: KeyPath) {
        self.pending.insert(path);
    }

    /// Activate every pending lock. Returns how many were committed.
    pub fn commit(&mut self) -> usize {
        let count = self.pending.len();
        self.active.append(&mut self.pending);
        count
    }

    /// Drop every pending lock. Returns how many were discarded.
    pub fn discard(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Active lock paths in sorted order.
    pub fn active(&self) -> impl Iterator<Item = &KeyPath> {
        self.active.iter()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> KeyPath {
        KeyPath::parse(raw, '.').unwrap()
    }

    #[test]
    fn ancestor_lock_covers_descendants() {
        let mut locks = LockTable::new();
        locks.lock(path("group"));
        assert!(locks.is_locked(&path("group")));
        assert!(locks.is_locked(&path("group.one.deep")));
        assert!(!locks.is_locked(&path("groups")));
        assert_eq!(locks.locking_prefix(&path("group.one")), Some(path("group")));
    }

    #[test]
    fn descendant_lock_does_not_cover_parent() {
        let mut locks = LockTable::new();
        locks.lock(path("dict.str"));
        assert!(locks.is_locked(&path("dict.str")));
        assert!(!locks.is_locked(&path("dict")));
    }

    #[test]
    fn locks_under_scans_descendants_only() {
        let mut locks = LockTable::new();
        locks.lock(path("group"));
        locks.lock(path("group.one"));
        locks.lock(path("group.two.deep"));
        locks.lock(path("groups.one"));
        let under: Vec<String> = locks.locks_under(&path("group")).map(|p| p.render('.')).collect();
        assert_eq!(under, vec!["group.one", "group.two.deep"]);
        assert_eq!(locks.locks_under(&path("group.one")).count(), 0);
        assert_eq!(locks.locks_under(&path("other")).count(), 0);
    }

    #[test]
    fn pending_locks_activate_on_commit() {
        let mut locks = LockTable::new();
        locks.stage(path("a"));
        assert!(!locks.is_locked(&path("a")));
        assert_eq!(locks.commit(), 1);
        assert!(locks.is_locked(&path("a")));
        assert_eq!(locks.commit(), 0);
    }

    #[test]
    fn discarded_locks_never_activate() {
        let mut locks = LockTable::new();
        locks.stage(path("a"));
        assert_eq!(locks.discard(), 1);
        assert_eq!(locks.commit(), 0);
        assert!(locks.is_empty());
    }
}
