//! Helpers for configuration trees.
//!
//! A tree is a JSON object. Objects nested inside it are branches; every
//! other value, including arrays and `null`, is a leaf.

use serde_json::{Map, Value};

use crate::path::KeyPath;

/// A configuration branch.
pub type Tree = Map<String, Value>;

/// Returns `true` if `value` is a branch (a nested object).
pub fn is_branch(value: &Value) -> bool {
    value.is_object()
}

/// Resolve `path` against `tree`, walking only through branches.
pub fn lookup<'a>(tree: &'a Tree, path: &KeyPath) -> Option<&'a Value> {
    let (last, init) = path.segments().split_last()?;
    let mut branch = tree;
    for segment in init {
        branch = branch.get(segment)?.as_object()?;
    }
    branch.get(last)
}

/// Resolve the branch that holds the final segment of `path`.
pub fn parent_branch_mut<'a>(tree: &'a mut Tree, path: &KeyPath) -> Option<&'a mut Tree> {
    let (_, init) = path.segments().split_last()?;
    let mut branch = tree;
    for segment in init {
        branch = branch.get_mut(segment)?.as_object_mut()?;
    }
    Some(branch)
}

/// Every leaf path beneath `tree`, in key order.
pub fn leaf_paths(tree: &Tree) -> Vec<KeyPath> {
    let mut out = Vec::new();
    collect_leaves(tree, &KeyPath::root(), &mut out);
    out
}

fn collect_leaves(tree: &Tree, prefix: &KeyPath, out: &mut Vec<KeyPath>) {
    for (key, value) in tree {
        let path = prefix.child(key.as_str());
        match value {
            Value::Object(branch) => collect_leaves(branch, &path, out),
            _ => out.push(path),
        }
    }
}
