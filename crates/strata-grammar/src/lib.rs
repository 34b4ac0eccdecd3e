//! Key grammar and operator registry for strata.
//!
//! Merge keys may carry a compact operator prefix that changes how their
//! value is merged:
//!
//! | Symbol | Kind     | Effect                                       |
//! |--------|----------|----------------------------------------------|
//! | `+`    | action   | concatenate arrays/strings, add numbers      |
//! | `-`    | action   | remove elements, subtract, strip substrings  |
//! | `=`    | action   | keep the existing value                      |
//! | `?`    | modifier | only if a value already exists               |
//! | `!`    | modifier | only if no value exists yet                  |
//! | `#`    | lock     | lock the key once the merge completes        |
//!
//! Actions and modifiers are extensible through [`OperatorRegistry`].
//!
//! # Quick Start
//!
//! ```rust
//! use strata_grammar::{Action, KeyGrammar, OperatorRegistry};
//! use serde_json::json;
//!
//! let mut registry = OperatorRegistry::default();
//! registry
//!     .register_action('*', Action::custom("replace", |_, new| Ok(new)), false, None)
//!     .unwrap();
//! let grammar = KeyGrammar::compile(&registry).unwrap();
//! let key = grammar.parse("?*#retries").unwrap();
//! assert_eq!(key.true_key, "retries");
//!
//! let action = registry.action('+').unwrap();
//! assert_eq!(action.apply('+', Some(json!([1])), json!([2])).unwrap(), json!([1, 2]));
//! ```

pub mod action;
pub mod error;
pub mod grammar;
pub mod modifier;
pub mod registry;
pub mod symbols;

pub use action::{Action, ActionFn};
pub use error::{ActionError, GrammarError, GrammarResult};
pub use grammar::{KeyGrammar, SeparatedKey};
pub use modifier::{Modifier, ModifierFn, OperationContext};
pub use registry::{OperatorRegistry, DEFAULT_LOCK_SYMBOL, DEFAULT_ORDERING};
pub use symbols::SymbolKind;
