//! Lifecycle event notifications.
//!
//! Observers register handlers with a [`SubscriberRegistry`] and receive an
//! [`Event`] each time the configuration is initialized or refreshed.

mod event;
mod id;
mod registry;

pub use event::{Event, EventKind};
pub use id::SubscriptionId;
pub use registry::{HandlerError, HandlerResult, SubscriberRegistry};

pub(crate) use registry::Delivery;
