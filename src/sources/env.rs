//! Environment variable configuration source.

use super::ConfigSource;
use crate::error::{ConfigError, Result};
use config::{Environment, Source};
use std::collections::HashMap;

/// Environment variables under a prefix, with a separator for nesting.
///
/// The prefix is joined to the key with a single `_`; the separator splits
/// the rest into nested keys. With prefix `APP` and separator `__`,
/// `APP_SERVER__PORT=8080` sets `server.port`. Numbers and booleans are
/// parsed, and empty variables are skipped.
///
/// ```rust
/// use configloader::sources::{ConfigSource, EnvSource};
///
/// let source = EnvSource::new("APP", "__");
/// assert_eq!(source.priority(), 300);
/// ```
pub struct EnvSource {
    prefix: String,
    prefix_separator: String,
    separator: String,
    priority: i32,
}

impl EnvSource {
    /// Environment source with priority 300, above files.
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            prefix_separator: "_".to_string(),
            separator: separator.into(),
            priority: 300,
        }
    }

    /// Join the prefix to the key with `prefix_separator` instead of `_`.
    pub fn with_prefix_separator(mut self, prefix_separator: impl Into<String>) -> Self {
        self.prefix_separator = prefix_separator.into();
        self
    }

    /// Set the priority for this source.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn environment(&self) -> Environment {
        Environment::with_prefix(&self.prefix)
            .prefix_separator(&self.prefix_separator)
            .separator(&self.separator)
            .ignore_empty(true)
            .try_parsing(true)
    }
}

impl ConfigSource for EnvSource {
    /// Keys come back dotted (`server.port`), ready to override file values.
    fn load(&self) -> Result<HashMap<String, config::Value>> {
        let values = self.environment().collect().map_err(|e| {
            ConfigError::LoadError(format!("Failed to read environment under {}: {}", self.prefix, e))
        })?;

        tracing::trace!(prefix = %self.prefix, keys = values.len(), "environment overrides read");
        Ok(values.into_iter().collect())
    }

    fn name(&self) -> String {
        format!("env:{}{}*", self.prefix, self.prefix_separator)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
