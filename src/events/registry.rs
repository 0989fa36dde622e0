//! Subscriber registry for lifecycle events.

use super::{Event, SubscriptionId};
use crate::error::{ConfigError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Error a handler may return. It is logged by the registry and goes no further.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single handler invocation.
pub type HandlerResult = std::result::Result<(), HandlerError>;

type Handler = Arc<dyn Fn(&Event) -> HandlerResult + Send + Sync>;

/// Counts from one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Delivery {
    /// Handlers present in the snapshot, all of which were called.
    pub(crate) invoked: usize,
    /// Handlers that returned an error or panicked.
    pub(crate) failed: usize,
}

/// Internal subscriber registry state.
struct SubscriberRegistryInner {
    subscribers: RwLock<HashMap<SubscriptionId, Handler>>,
}

/// Registry for lifecycle event subscribers.
///
/// Create one registry when the process starts and hand clones of it to
/// whatever emits or subscribes. Clones share the same subscriptions.
///
/// Broadcasting copies the current handler set under a short read lock and
/// then calls the handlers with the lock released, so a slow handler never
/// holds up `subscribe` or `unsubscribe`, and handlers may themselves
/// subscribe or unsubscribe.
///
/// A subscription registered after a broadcast has taken its snapshot does not
/// see that broadcast. A subscription removed after the snapshot may still
/// receive it.
///
/// # Examples
///
/// ```rust
/// use configloader::events::{EventKind, SubscriberRegistry};
///
/// # fn example() -> configloader::error::Result<()> {
/// let registry = SubscriberRegistry::new();
///
/// let id = registry.subscribe(|event| {
///     if event.kind() == EventKind::Refreshed {
///         println!("Config refreshed");
///     }
///     Ok(())
/// })?;
///
/// registry.unsubscribe(id)?;
/// assert!(registry.unsubscribe(id).is_err());
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct SubscriberRegistry {
    inner: Arc<SubscriberRegistryInner>,
}

impl SubscriberRegistry {
    /// Create a new, empty subscriber registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubscriberRegistryInner {
                subscribers: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register `handler` and return the id it was stored under.
    ///
    /// The handler is called for every event broadcast while it stays
    /// registered. Errors it returns are logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IdSpaceExhausted`] if no further id can be minted.
    pub fn subscribe<F>(&self, handler: F) -> Result<SubscriptionId>
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        let id = SubscriptionId::mint()?;
        let total = {
            let mut subscribers = self.inner.subscribers.write();
            subscribers.insert(id, Arc::new(handler));
            subscribers.len()
        };

        tracing::debug!(subscription = %id, total, "subscriber registered");
        Ok(id)
    }

    /// Remove the subscription identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SubscriberNotFound`] if `id` is not registered
    /// here, either because it was never issued by this registry or because it
    /// was already removed. The registry is left unchanged in that case.
    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let removed = self.inner.subscribers.write().remove(&id);

        match removed {
            Some(_) => {
                tracing::debug!(subscription = %id, "subscriber removed");
                Ok(())
            }
            None => Err(ConfigError::SubscriberNotFound(id)),
        }
    }

    /// Whether `id` is currently registered.
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.read().contains_key(&id)
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Deliver `event` to every handler registered at the moment of the call.
    ///
    /// Handlers run synchronously on the calling thread, in no particular
    /// order. A failing or panicking handler does not stop delivery to the
    /// others.
    pub(crate) fn notify(&self, event: &Event) -> Delivery {
        let snapshot: Vec<(SubscriptionId, Handler)> = self
            .inner
            .subscribers
            .read()
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect();

        let mut delivery = Delivery::default();
        for (id, handler) in snapshot {
            delivery.invoked += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    delivery.failed += 1;
                    tracing::warn!(
                        subscription = %id,
                        kind = %event.kind(),
                        error = %err,
                        "subscriber failed to handle event"
                    );
                }
                Err(payload) => {
                    delivery.failed += 1;
                    tracing::error!(
                        subscription = %id,
                        kind = %event.kind(),
                        panic = panic_message(&*payload),
                        "subscriber panicked while handling event"
                    );
                }
            }
        }

        tracing::trace!(
            kind = %event.kind(),
            invoked = delivery.invoked,
            failed = delivery.failed,
            "event broadcast"
        );
        delivery
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriberRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
