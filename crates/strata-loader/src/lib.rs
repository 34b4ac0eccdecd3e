//! File and environment loading for strata.
//!
//! Layer files are JSON (`.json`) or TOML (`.toml`) documents whose top
//! level is an object. Operator prefixes work the same in both formats;
//! TOML keys carrying symbols must be quoted (`"+list" = [3]`).
//!
//! ```no_run
//! use strata_loader::{from_environment, from_files};
//! use strata_merge::ConfigCache;
//!
//! let config = from_files(["base.json", "site.toml"]).unwrap();
//! println!("{:?}", config.get("group.two"));
//!
//! // Files listed in $APP_CONFIG_PATH, separated like $PATH.
//! let cache = ConfigCache::new();
//! let shared = from_environment("APP_CONFIG_PATH", Some(&cache)).unwrap();
//! println!("{:?}", shared.locked());
//! ```

pub mod error;
pub mod format;
pub mod loader;

pub use error::{LoadError, LoadResult};
pub use format::Format;
pub use loader::{from_environment, from_files, load_file, resolve_env};
