//! # configloader
//!
//! Layered configuration loading with lifecycle events for independent observers.
//!
//! ## Overview
//!
//! Components that care about configuration milestones subscribe a handler to a
//! [`SubscriberRegistry`](events::SubscriberRegistry). The configuration handle
//! broadcasts an [`Event`](events::Event) when it is initialized and each time it
//! is refreshed, so emitters and observers never need to know about each other.
//!
//! - Subscribe, unsubscribe and broadcast are safe to call from any thread
//! - Broadcast snapshots the subscribers and runs handlers outside the lock
//! - A failing or panicking handler never affects the emitter or other handlers
//! - Event payloads are type-erased and recovered by the handler
//! - Reads of the current configuration are lock-free (`arc-swap`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use configloader::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, Clone)]
//! struct AppConfig {
//!     port: u16,
//! }
//!
//! # fn example() -> configloader::error::Result<()> {
//! let registry = SubscriberRegistry::new();
//!
//! let id = registry.subscribe(|event| {
//!     match event.kind() {
//!         EventKind::Inited => println!("Config inited"),
//!         EventKind::Refreshed => println!("Config refreshed"),
//!         EventKind::Custom(_) => println!("Unknown event sent"),
//!     }
//!     Ok(())
//! })?;
//!
//! let config = ConfigHandle::builder()
//!     .with_file("config/default.yaml")
//!     .with_env_overrides("APP", "__")
//!     .with_registry(registry.clone())
//!     .build::<AppConfig>()?;
//!
//! config.init();
//! config.refresh()?;
//!
//! registry.unsubscribe(id)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `validation` (default): the [`Validate`](core::Validate) trait and
//!   [`ConfigBuilder::with_validate`](core::ConfigBuilder::with_validate)

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod events;
pub mod sources;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfigBuilder, ConfigHandle};
    pub use crate::error::{ConfigError, Result, ValidationError};
    pub use crate::events::{
        Event, EventKind, HandlerError, HandlerResult, SubscriberRegistry, SubscriptionId,
    };

    #[cfg(feature = "validation")]
    pub use crate::core::Validate;
}
