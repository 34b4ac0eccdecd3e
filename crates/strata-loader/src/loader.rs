//! Building configurations from layer files.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use strata_merge::{ConfigCache, Configuration};
use strata_types::{SourceId, Tree};

use crate::error::{LoadError, LoadResult};
use crate::format::Format;

/// Read one layer file. The format follows the file extension and the
/// top level must be an object (a table, for TOML).
pub fn load_file(path: impl AsRef<Path>) -> LoadResult<Tree> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match format.parse(&contents) {
        Ok(Value::Object(tree)) => {
            debug!(path = %path.display(), keys = tree.len(), "loaded layer");
            Ok(tree)
        }
        Ok(_) => Err(LoadError::NotAnObject {
            path: path.to_path_buf(),
        }),
        Err(reason) => Err(LoadError::Parse {
            path: path.to_path_buf(),
            reason,
        }),
    }
}

/// Merge `paths` in order, the last providing the final overrides. Each
/// layer is attributed to its path.
///
/// Every file is read before the first merge, so an unreadable file leaves
/// nothing half built.
pub fn from_files<I, P>(paths: I) -> LoadResult<Configuration>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let layers = paths
        .into_iter()
        .map(|path| {
            let path = path.as_ref();
            let name = SourceId::named(path.display().to_string());
            load_file(path).map(|tree| (tree, Some(name)))
        })
        .collect::<LoadResult<Vec<_>>>()?;
    Ok(Configuration::from_layers(layers)?)
}

/// Split the value of `var` into layer paths using the platform path-list
/// separator. Empty entries are skipped.
pub fn resolve_env(var: &str) -> LoadResult<Vec<PathBuf>> {
    let raw = env::var_os(var).ok_or_else(|| LoadError::EnvNotSet(var.to_string()))?;
    let mut paths = Vec::new();
    for path in env::split_paths(&raw) {
        if path.as_os_str().is_empty() {
            warn!(var, "skipping empty entry in layer path list");
            continue;
        }
        paths.push(path);
    }
    Ok(paths)
}

/// Build a configuration from the files listed in `var`.
///
/// With a cache, a configuration already cached under `var` is returned
/// as is; otherwise the freshly built one is stored there first.
pub fn from_environment(var: &str, cache: Option<&ConfigCache>) -> LoadResult<Arc<Configuration>> {
    if let Some(cache) = cache {
        if let Some(hit) = cache.get(var)? {
            debug!(var, "using cached configuration");
            return Ok(hit);
        }
    }

    let config = from_files(resolve_env(var)?)?;
    match cache {
        Some(cache) => {
            cache.insert(var, config.clone())?;
            Ok(Arc::new(config))
        }
        None => Ok(Arc::new(config)),
    }
}
