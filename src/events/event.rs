//! Lifecycle event values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Kind of a lifecycle event.
///
/// Kinds only compare for equality; there is no ordering between them.
/// `Custom` leaves room for caller-defined kinds, including negative
/// sentinel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The configuration finished its initial load.
    Inited,
    /// The configuration was reloaded or replaced.
    Refreshed,
    /// A caller-defined kind.
    Custom(i32),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inited => write!(f, "inited"),
            Self::Refreshed => write!(f, "refreshed"),
            Self::Custom(code) => write!(f, "custom({})", code),
        }
    }
}

/// An event broadcast to subscribers.
///
/// The payload is type-erased. Its concrete type is an agreement between the
/// emitter and its subscribers; a handler asking for the wrong type simply gets
/// `None` back. Cloning an event shares the payload rather than copying it.
///
/// # Examples
///
/// ```rust
/// use configloader::events::{Event, EventKind};
///
/// let event = Event::with_data(EventKind::Custom(7), String::from("payload"));
/// assert_eq!(event.kind(), EventKind::Custom(7));
/// assert_eq!(event.data::<String>().map(String::as_str), Some("payload"));
/// assert!(event.data::<u32>().is_none());
/// ```
#[derive(Clone)]
pub struct Event {
    kind: EventKind,
    data: Option<Arc<dyn Any + Send + Sync>>,
}

impl Event {
    /// Create an event without a payload.
    pub fn new(kind: EventKind) -> Self {
        Self { kind, data: None }
    }

    /// Create an event carrying `data`.
    pub fn with_data<D>(kind: EventKind, data: D) -> Self
    where
        D: Any + Send + Sync,
    {
        Self::with_shared(kind, Arc::new(data))
    }

    /// Create an event carrying an already shared payload.
    ///
    /// Handlers calling [`Event::data_arc`] receive this very allocation.
    pub fn with_shared<D>(kind: EventKind, data: Arc<D>) -> Self
    where
        D: Any + Send + Sync,
    {
        Self {
            kind,
            data: Some(data),
        }
    }

    /// The event kind.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Whether the event carries any payload.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Borrow the payload as `D`, if present and of that type.
    pub fn data<D: Any>(&self) -> Option<&D> {
        self.data.as_deref().and_then(|data| data.downcast_ref::<D>())
    }

    /// Get a shared handle to the payload as `D`, if present and of that type.
    pub fn data_arc<D>(&self) -> Option<Arc<D>>
    where
        D: Any + Send + Sync,
    {
        self.data
            .as_ref()
            .and_then(|data| Arc::clone(data).downcast::<D>().ok())
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("has_data", &self.data.is_some())
            .finish()
    }
}
