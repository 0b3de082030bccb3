//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

use crate::entry::EntryType;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required entry was read but no source provided a value
    #[error("Missing configuration: '{key}' is required but was not set")]
    MissingConfiguration { key: String },

    /// A present value could not be parsed as the requested type
    #[error("Invalid value for '{key}': expected {expected}, got '{value}'")]
    InvalidValue {
        key: String,
        expected: EntryType,
        value: String,
    },

    /// A properties file key that maps to no known entry
    #[error("Unknown property '{key}' for module {module}")]
    UnknownProperty { module: String, key: String },

    /// Values are present and well-formed but inconsistent
    #[error("Invalid configuration for '{key}': {message}")]
    Validation { key: String, message: String },

    /// A getter asked for an entry the module does not declare
    #[error("Module {module} declares no entry named '{name}'")]
    UnknownEntry { module: String, name: String },

    /// A prefix that cannot be mapped back unambiguously
    #[error("Invalid prefix '{prefix}': prefixes must be non-empty and must not contain '.'")]
    InvalidPrefix { prefix: String },

    /// Prefix discovery pattern could not be compiled
    #[error("Invalid discovery pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// IO error reading a properties file
    #[error("Failed to read properties file {}: {source}", .path.display())]
    PropertiesRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create a missing configuration error for a canonical key
    pub fn missing(key: impl Into<String>) -> Self {
        Self::MissingConfiguration { key: key.into() }
    }

    /// Create an invalid value error
    pub fn invalid_value(key: impl Into<String>, expected: EntryType, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            expected,
            value: value.into(),
        }
    }

    /// Canonical key this error refers to, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MissingConfiguration { key }
            | Self::InvalidValue { key, .. }
            | Self::UnknownProperty { key, .. }
            | Self::Validation { key, .. } => Some(key),
            _ => None,
        }
    }
}
