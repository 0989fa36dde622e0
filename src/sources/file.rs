//! File-based configuration source.

use super::ConfigSource;
use crate::error::{ConfigError, Result};
use config::{File, FileFormat, Source};
use std::collections::HashMap;
use std::path::PathBuf;

/// Configuration file in YAML, TOML or JSON, chosen by extension.
///
/// # Examples
///
/// ```rust,no_run
/// use configloader::sources::FileSource;
///
/// let base = FileSource::new("config/default.yaml");
/// let local = FileSource::new("config/local.toml").optional().with_priority(150);
/// ```
pub struct FileSource {
    path: PathBuf,
    priority: i32,
    required: bool,
}

impl FileSource {
    /// Create a required file source with priority 100.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            priority: 100,
            required: true,
        }
    }

    /// Set the priority for this source.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Treat a missing file as empty instead of failing.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn format(&self) -> Result<FileFormat> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Ok(FileFormat::Yaml),
            Some("toml") => Ok(FileFormat::Toml),
            Some("json") => Ok(FileFormat::Json),
            Some(other) => Err(ConfigError::LoadError(format!(
                "{}: unsupported extension .{} (expected .yaml, .yml, .toml or .json)",
                self.path.display(),
                other
            ))),
            None => Err(ConfigError::LoadError(format!(
                "{}: no extension to pick a format from",
                self.path.display()
            ))),
        }
    }
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<HashMap<String, config::Value>> {
        let format = self.format()?;

        if !self.path.is_file() {
            if self.required {
                return Err(ConfigError::LoadError(format!(
                    "{}: file not found",
                    self.path.display()
                )));
            }
            tracing::debug!(path = %self.path.display(), "optional configuration file absent");
            return Ok(HashMap::new());
        }

        let values = File::from(self.path.as_path())
            .format(format)
            .collect()
            .map_err(|e| {
                ConfigError::DeserializationError(format!("{}: {}", self.path.display(), e))
            })?;
        Ok(values.into_iter().collect())
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}
