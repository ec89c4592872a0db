//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Connection is missing a required authentication key
    #[error("connection '{name}' is missing required key '{key}'")]
    MissingKey {
        /// Connection name
        name: String,
        /// Missing key
        key: &'static str,
    },

    /// Setting has an invalid value
    #[error("{section}.{field} is invalid: {message}")]
    InvalidValue {
        /// Config section
        section: &'static str,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// Referenced connection is not configured
    #[error("unknown connection '{0}'")]
    UnknownConnection(String),
}

impl ConfigError {
    /// Create a MissingKey error
    pub fn missing_key(name: impl Into<String>, key: &'static str) -> Self {
        Self::MissingKey {
            name: name.into(),
            key,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }
}
