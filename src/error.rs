//! Error types for configloader.

use crate::events::SubscriptionId;
use std::fmt;

/// Result type alias for configloader operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading configuration or managing subscriptions.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No live subscription exists for the given identifier.
    #[error("Subscriber not found: {0}")]
    SubscriberNotFound(SubscriptionId),

    /// The process-wide identifier counter cannot mint another id.
    #[error("Subscription identifier space exhausted")]
    IdSpaceExhausted,

    /// Failed to load configuration from a source.
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    /// Failed to deserialize configuration.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Whether this error came out of a reload (load, parse or validation)
    /// rather than subscription bookkeeping.
    pub fn is_reload_error(&self) -> bool {
        matches!(
            self,
            Self::LoadError(_) | Self::DeserializationError(_) | Self::ValidationError(_)
        )
    }
}

/// Validation error for configuration validation.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name/path
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}
