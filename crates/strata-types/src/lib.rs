//! Foundation types for strata.
//!
//! This crate provides the addressing and identity types shared by every
//! other strata crate. Configuration data itself is modeled with
//! [`serde_json::Value`]: an object is a branch, anything else is a leaf.
//!
//! # Key Types
//!
//! - [`KeyPath`]: Ordered key segments addressing a node in a tree
//! - [`SourceId`]: Identifier of the layer that contributed a value
//! - [`Tree`]: A configuration branch (`serde_json::Map`)

pub mod error;
pub mod path;
pub mod source;
pub mod tree;

pub use error::TypeError;
pub use path::{KeyPath, DEFAULT_SEPARATOR};
pub use source::SourceId;
pub use tree::{is_branch, Tree};
