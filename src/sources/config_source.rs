//! Configuration source trait.

use crate::error::Result;
use std::collections::HashMap;

/// A place configuration values come from.
///
/// Implement this for custom backends (key-value stores, databases, test
/// fixtures). Sources are read on every build and every
/// [`refresh`](crate::core::ConfigHandle::refresh).
pub trait ConfigSource: Send + Sync {
    /// Read the source into a flat key-value map.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or parsed. A refresh that
    /// hits this error broadcasts nothing.
    fn load(&self) -> Result<HashMap<String, config::Value>>;

    /// Human-readable name, used in errors and logs.
    fn name(&self) -> String;

    /// Precedence of this source; higher overrides lower.
    ///
    /// Built-in defaults: files start at 100, environment variables use 300.
    fn priority(&self) -> i32 {
        100
    }
}
