//! Merges configuration sources into a typed value.

use crate::error::{ConfigError, Result};
use crate::sources::ConfigSource;
use config::{Value, ValueKind};
use serde::de::DeserializeOwned;

/// Loads and merges configuration from an ordered set of sources.
///
/// Sources are applied lowest priority first, so keys from a higher priority
/// source overwrite the same keys from lower ones.
pub struct ConfigLoader {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigLoader {
    /// Create a loader with no sources.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add a configuration source.
    pub fn add_source(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source has been registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Read every source and deserialize the merged result into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadError`] when there are no sources or one of
    /// them fails, and [`ConfigError::DeserializationError`] when the merged
    /// values do not fit `T`.
    pub fn load<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if self.sources.is_empty() {
            return Err(ConfigError::LoadError(
                "No configuration sources specified".to_string(),
            ));
        }

        let mut builder = config::Config::builder();
        for source in self.ordered() {
            let values = source.load().map_err(|e| {
                ConfigError::LoadError(format!("Failed to load source '{}': {}", source.name(), e))
            })?;

            let mut leaves = Vec::new();
            for (key, value) in values {
                collect_leaves(key, value, &mut leaves);
            }

            for (key, value) in leaves {
                builder = builder.set_override(&key, value).map_err(|e| {
                    ConfigError::LoadError(format!(
                        "Failed to merge source '{}': {}",
                        source.name(),
                        e
                    ))
                })?;
            }
        }

        let merged = builder
            .build()
            .map_err(|e| ConfigError::LoadError(format!("Failed to build configuration: {}", e)))?;

        tracing::debug!(sources = ?self.source_names(), "configuration sources merged");

        merged
            .try_deserialize::<T>()
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Source names, lowest priority first.
    pub fn source_names(&self) -> Vec<String> {
        self.ordered().map(|s| s.name()).collect()
    }

    fn ordered(&self) -> impl Iterator<Item = &dyn ConfigSource> + '_ {
        let mut sorted: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| &**s).collect();
        // Stable sort keeps insertion order between equal priorities.
        sorted.sort_by_key(|s| s.priority());
        sorted.into_iter()
    }
}

/// Split nested tables into dotted leaf paths.
///
/// Overrides are keyed by path, so a table set by one source would replace
/// the whole table an earlier source set. Leaves only replace leaves.
fn collect_leaves(path: String, value: Value, out: &mut Vec<(String, Value)>) {
    match value.kind {
        ValueKind::Table(_) => {
            if let Ok(table) = value.into_table() {
                for (key, child) in table {
                    collect_leaves(format!("{}.{}", path, key), child, out);
                }
            }
        }
        _ => out.push((path, value)),
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
