//! Configuration handle, loading and lifecycle emitters.

mod builder;
mod handle;
mod loader;

#[cfg(feature = "validation")]
mod validation;

pub use builder::ConfigBuilder;
pub use handle::ConfigHandle;
pub use loader::ConfigLoader;

#[cfg(feature = "validation")]
pub use validation::Validate;
