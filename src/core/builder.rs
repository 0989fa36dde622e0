//! Builder for constructing ConfigHandle instances.

use crate::core::handle::Validator;
use crate::core::{ConfigHandle, ConfigLoader};
use crate::error::{Result, ValidationError};
use crate::events::SubscriberRegistry;
use crate::sources::{ConfigSource, EnvSource, FileSource};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "validation")]
use crate::core::Validate;

/// Validator stored before the target type is known.
type AnyValidator =
    Arc<dyn Fn(&dyn Any) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Builder for a [`ConfigHandle`].
///
/// # Examples
///
/// ```rust,no_run
/// use configloader::prelude::*;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, Clone)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// # fn example() -> Result<()> {
/// let registry = SubscriberRegistry::new();
/// let config = ConfigHandle::builder()
///     .with_file("config/default.yaml")
///     .with_file("config/production.yaml")
///     .with_env_overrides("APP", "__")
///     .with_registry(registry)
///     .build::<AppConfig>()?;
///
/// config.init();
/// # Ok(())
/// # }
/// ```
pub struct ConfigBuilder {
    file_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
    custom_sources: Vec<Box<dyn ConfigSource>>,
    validators: Vec<AnyValidator>,
    registry: Option<SubscriberRegistry>,
}

impl ConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            file_paths: Vec::new(),
            env_prefix: None,
            env_separator: None,
            custom_sources: Vec::new(),
            validators: Vec::new(),
            registry: None,
        }
    }

    /// Add a file source. The format follows the extension (`.yaml`, `.yml`,
    /// `.toml`, `.json`).
    ///
    /// Later files take precedence over earlier ones.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push(path.into());
        self
    }

    /// Read overrides from environment variables.
    ///
    /// With prefix `APP` and separator `__`, `APP_SERVER__PORT=8080` sets
    /// `server.port`. Environment overrides take precedence over files.
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Add a custom configuration source.
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.custom_sources.push(Box::new(source));
        self
    }

    /// Add a validation function checked on build, refresh and update.
    ///
    /// A validator written for a different type than the one passed to
    /// [`build`](Self::build) rejects every value.
    pub fn with_validation<F, T>(mut self, validator: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
        T: 'static,
    {
        self.validators.push(Arc::new(move |config: &dyn Any| {
            let typed_config = config
                .downcast_ref::<T>()
                .ok_or_else(|| ValidationError::custom("Type mismatch in validator"))?;
            validator(typed_config)
        }));
        self
    }

    /// Check values with their [`Validate`] implementation.
    #[cfg(feature = "validation")]
    pub fn with_validate<T: Validate + 'static>(self) -> Self {
        self.with_validation(|config: &T| config.validate())
    }

    /// Broadcast lifecycle events through `registry`.
    ///
    /// Without this the handle gets a registry of its own, reachable through
    /// [`ConfigHandle::registry`].
    pub fn with_registry(mut self, registry: SubscriberRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Load, validate and wrap the initial configuration.
    ///
    /// Building does not broadcast anything; call [`ConfigHandle::init`] once
    /// the rest of the application is ready to hear about it.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial load, deserialization or validation
    /// fails.
    pub fn build<T>(self) -> Result<ConfigHandle<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let mut loader = ConfigLoader::new();

        // 100, 110, 120, ...
        for (index, path) in self.file_paths.iter().enumerate() {
            let priority = 100 + (index as i32 * 10);
            loader.add_source(Box::new(FileSource::new(path).with_priority(priority)));
        }

        for source in self.custom_sources {
            loader.add_source(source);
        }

        if let (Some(prefix), Some(separator)) = (self.env_prefix, self.env_separator) {
            loader.add_source(Box::new(EnvSource::new(prefix, separator)));
        }

        let validator = typed_validator::<T>(self.validators);
        let config: T = loader.load()?;
        if let Some(validator) = &validator {
            validator(&config)?;
        }

        tracing::debug!(sources = loader.len(), "initial configuration loaded");

        Ok(ConfigHandle::from_parts(
            config,
            loader,
            validator,
            self.registry.unwrap_or_default(),
        ))
    }
}

/// Fold the type-erased validators into one typed validator.
fn typed_validator<T: 'static>(validators: Vec<AnyValidator>) -> Option<Validator<T>> {
    if validators.is_empty() {
        return None;
    }

    Some(Arc::new(move |config: &T| {
        let mut errors: Vec<ValidationError> = validators
            .iter()
            .filter_map(|validator| validator(config as &dyn Any).err())
            .collect();

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }))
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigHandle<()> {
    /// Create a new builder for constructing a configuration handle.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}
