//! Configuration validation support.

use crate::error::ValidationError;

/// Validation hook for configuration types.
///
/// Register it with
/// [`ConfigBuilder::with_validate`](crate::core::ConfigBuilder::with_validate)
/// and every load, refresh and update is checked before it becomes current. A
/// value that fails is rejected and no event is broadcast for it.
///
/// # Examples
///
/// ```rust
/// use configloader::core::Validate;
/// use configloader::error::ValidationError;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, Clone)]
/// struct ServerConfig {
///     port: u16,
///     workers: usize,
/// }
///
/// impl Validate for ServerConfig {
///     fn validate(&self) -> Result<(), ValidationError> {
///         let mut errors = Vec::new();
///         if self.port < 1024 {
///             errors.push(ValidationError::invalid_field("port", "must be >= 1024"));
///         }
///         if self.workers == 0 {
///             errors.push(ValidationError::invalid_field("workers", "must be greater than 0"));
///         }
///         match errors.len() {
///             0 => Ok(()),
///             1 => Err(errors.remove(0)),
///             _ => Err(ValidationError::Multiple(errors)),
///         }
///     }
/// }
/// ```
pub trait Validate {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` describing the first or all problems found.
    fn validate(&self) -> Result<(), ValidationError>;
}
