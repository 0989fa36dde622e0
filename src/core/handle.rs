//! The configuration handle and its lifecycle emitters.

use crate::core::ConfigLoader;
use crate::error::{ConfigError, Result, ValidationError};
use crate::events::{
    Delivery, Event, EventKind, HandlerResult, SubscriberRegistry, SubscriptionId,
};
use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::sync::Arc;

/// Type alias for validator functions.
pub(crate) type Validator<T> =
    Arc<dyn Fn(&T) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Handle to the current configuration.
///
/// Reads are lock-free snapshots. [`init`](Self::init),
/// [`refresh`](Self::refresh) and [`update`](Self::update) broadcast lifecycle
/// events through the [`SubscriberRegistry`] the handle was built with. Each
/// event carries the configuration snapshot it refers to as its payload, so a
/// handler can recover it with `event.data::<T>()`.
///
/// # Examples
///
/// ```rust
/// use configloader::prelude::*;
///
/// # fn example() -> Result<()> {
/// let registry = SubscriberRegistry::new();
/// let config = ConfigHandle::with_registry(8080u16, registry.clone());
///
/// let id = registry.subscribe(|event| {
///     if event.kind() == EventKind::Inited {
///         println!("port {:?}", event.data::<u16>());
///     }
///     Ok(())
/// })?;
///
/// config.init();
/// registry.unsubscribe(id)?;
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct ConfigHandle<T> {
    current: Arc<ArcSwap<T>>,
    loader: Option<Arc<ConfigLoader>>,
    validator: Option<Validator<T>>,
    registry: SubscriberRegistry,
}

impl<T> ConfigHandle<T>
where
    T: Any + Send + Sync,
{
    /// Create a handle around a fixed initial value with its own registry.
    ///
    /// Without a loader, [`refresh`](Self::refresh) always fails; use
    /// [`update`](Self::update) to replace the value.
    pub fn new(initial: T) -> Self {
        Self::with_registry(initial, SubscriberRegistry::new())
    }

    /// Create a handle that broadcasts through `registry`.
    pub fn with_registry(initial: T, registry: SubscriberRegistry) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(initial)),
            loader: None,
            validator: None,
            registry,
        }
    }

    pub(crate) fn from_parts(
        initial: T,
        loader: ConfigLoader,
        validator: Option<Validator<T>>,
        registry: SubscriberRegistry,
    ) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(initial)),
            loader: Some(Arc::new(loader)),
            validator,
            registry,
        }
    }

    /// Get the current configuration snapshot.
    pub fn get(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// The registry events are broadcast through.
    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Subscribe to lifecycle events. See [`SubscriberRegistry::subscribe`].
    pub fn subscribe<F>(&self, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.registry.subscribe(handler)
    }

    /// Remove a subscription. See [`SubscriberRegistry::unsubscribe`].
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.registry.unsubscribe(id)
    }

    /// Announce that the configuration is initialized.
    ///
    /// Broadcasts [`EventKind::Inited`] with the current snapshot to every
    /// subscriber and returns once all of them have run. Handler failures are
    /// logged, never returned. Calling this more than once broadcasts again.
    pub fn init(&self) {
        let delivery = self.broadcast(EventKind::Inited, self.get());
        tracing::info!(subscribers = delivery.invoked, "configuration initialized");
    }

    /// Reload from the configured sources and announce the new value.
    ///
    /// On success the new snapshot is swapped in and [`EventKind::Refreshed`]
    /// is broadcast. On failure nothing is broadcast and the previous snapshot
    /// stays current.
    ///
    /// # Errors
    ///
    /// Returns the load, deserialization or validation error, or a
    /// [`ConfigError::LoadError`] if the handle has no loader.
    pub fn refresh(&self) -> Result<()>
    where
        T: DeserializeOwned,
    {
        let reloaded = self.reload().inspect_err(|err| {
            tracing::warn!(error = %err, "configuration refresh failed");
        })?;

        self.replace(reloaded);
        Ok(())
    }

    /// Replace the configuration with `new_config` and announce it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if a validator rejects the
    /// value; nothing is broadcast in that case.
    pub fn update(&self, new_config: T) -> Result<()> {
        self.validate(&new_config)?;
        self.replace(new_config);
        Ok(())
    }

    fn reload(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let loader = self
            .loader
            .as_ref()
            .ok_or_else(|| ConfigError::LoadError("No loader available for refresh".to_string()))?;

        let new_config: T = loader.load()?;
        self.validate(&new_config)?;
        Ok(new_config)
    }

    fn validate(&self, config: &T) -> Result<()> {
        match &self.validator {
            Some(validator) => validator(config).map_err(ConfigError::from),
            None => Ok(()),
        }
    }

    fn replace(&self, new_config: T) {
        let snapshot = Arc::new(new_config);
        self.current.store(Arc::clone(&snapshot));

        let delivery = self.broadcast(EventKind::Refreshed, snapshot);
        tracing::info!(
            subscribers = delivery.invoked,
            failed = delivery.failed,
            "configuration refreshed"
        );
    }

    fn broadcast(&self, kind: EventKind, snapshot: Arc<T>) -> Delivery {
        self.registry.notify(&Event::with_shared(kind, snapshot))
    }
}

impl<T> Clone for ConfigHandle<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            loader: self.loader.clone(),
            validator: self.validator.clone(),
            registry: self.registry.clone(),
        }
    }
}
