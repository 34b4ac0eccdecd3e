//! Named configuration cache.
//!
//! [`ConfigCache`] maps arbitrary names to configuration snapshots. It is
//! an ordinary value: create one at startup and pass it to whatever needs
//! to share resolved configurations. Nothing is cached implicitly.
//!
//! Concurrent inserts under the same name are last-writer-wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::configuration::Configuration;
use crate::error::{ConfigError, ConfigResult};

/// A registry of named configuration snapshots.
#[derive(Debug, Default)]
pub struct ConfigCache {
    entries: RwLock<HashMap<String, Arc<Configuration>>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `config` under `name`, returning the snapshot it replaced.
    pub fn insert(
        &self,
        name: &str,
        config: Configuration,
    ) -> ConfigResult<Option<Arc<Configuration>>> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| ConfigError::CachePoisoned(e.to_string()))?;
        debug!(name, "cached configuration");
        Ok(entries.insert(name.to_string(), Arc::new(config)))
    }

    /// The snapshot cached under `name`, if any.
    pub fn get(&self, name: &str) -> ConfigResult<Option<Arc<Configuration>>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| ConfigError::CachePoisoned(e.to_string()))?;
        Ok(entries.get(name).cloned())
    }

    pub fn remove(&self, name: &str) -> ConfigResult<Option<Arc<Configuration>>> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| ConfigError::CachePoisoned(e.to_string()))?;
        Ok(entries.remove(name))
    }

    /// Drop every cached snapshot.
    pub fn clear(&self) -> ConfigResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| ConfigError::CachePoisoned(e.to_string()))?;
        entries.clear();
        Ok(())
    }

    /// Cached names in sorted order.
    pub fn names(&self) -> ConfigResult<Vec<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| ConfigError::CachePoisoned(e.to_string()))?;
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_types::Tree;

    fn layer(value: serde_json::Value) -> Tree {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn missing_name_is_none() {
        let cache = ConfigCache::new();
        assert!(cache.get("app").unwrap().is_none());
    }

    #[test]
    fn cached_snapshot_is_retrievable() {
        let cache = ConfigCache::new();
        let config = Configuration::seeded(&layer(json!({"a": 1})), None).unwrap();
        config.cache(&cache, "app").unwrap();
        let cached = cache.get("app").unwrap().unwrap();
        assert_eq!(cached.get("a").unwrap(), &json!(1));
        assert_eq!(cache.names().unwrap(), vec!["app".to_string()]);
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let cache = ConfigCache::new();
        let mut config = Configuration::seeded(&layer(json!({"a": 1})), None).unwrap();
        config.cache(&cache, "app").unwrap();
        config.set("a", json!(2)).unwrap();
        assert_eq!(cache.get("app").unwrap().unwrap().get("a").unwrap(), &json!(1));
    }

    #[test]
    fn last_writer_wins() {
        let cache = ConfigCache::new();
        let first = Configuration::seeded(&layer(json!({"v": "first"})), None).unwrap();
        let second = Configuration::seeded(&layer(json!({"v": "second"})), None).unwrap();
        assert!(cache.insert("app", first).unwrap().is_none());
        let replaced = cache.insert("app", second).unwrap().unwrap();
        assert_eq!(replaced.get("v").unwrap(), &json!("first"));
        assert_eq!(cache.get("app").unwrap().unwrap().get("v").unwrap(), &json!("second"));
    }

    #[test]
    fn remove_and_clear() {
        let cache = ConfigCache::new();
        cache.insert("a", Configuration::new()).unwrap();
        cache.insert("b", Configuration::new()).unwrap();
        assert!(cache.remove("a").unwrap().is_some());
        cache.clear().unwrap();
        assert!(cache.names().unwrap().is_empty());
    }
}
