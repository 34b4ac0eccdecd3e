//! Merge engine for strata.
//!
//! Combines layered configuration trees into one resolved tree, records
//! which layer contributed every leaf, and enforces key locks. Keys in a
//! layer may carry an operator prefix (`+list`, `?-count`, `=#name`) that
//! changes how their value is merged; see [`strata_grammar`] for the key
//! grammar and the operator registry.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use strata_merge::Configuration;
//! use strata_types::SourceId;
//!
//! let base = json!({"group": {"one": 1, "two": 2}, "list": [1, 2]});
//! let mut config = Configuration::seeded(base.as_object().unwrap(), Some("base".into())).unwrap();
//!
//! let overlay = json!({"group": {"two": 3}, "+list": [3], "#name": "svc"});
//! config.merge(overlay.as_object().unwrap(), Some("overlay".into())).unwrap();
//!
//! assert_eq!(config.get("group.two").unwrap(), &json!(3));
//! assert_eq!(config.get("list").unwrap(), &json!([1, 2, 3]));
//! assert_eq!(config.source_of("group.one").unwrap(), &SourceId::named("base"));
//! assert!(config.is_locked("name").unwrap());
//! assert!(config.set("name", json!("other")).is_err());
//! ```

pub mod cache;
pub mod configuration;
mod engine;
pub mod error;
pub mod locks;
pub mod options;
pub mod provenance;

// Re-exports for convenience.
pub use cache::ConfigCache;
pub use configuration::{Configuration, SourceLookup};
pub use error::{ConfigError, ConfigResult};
pub use locks::LockTable;
pub use options::ConfigOptions;
pub use provenance::ProvenanceIndex;
