//! Bean factory error types

use forage_config::ConfigError;
use thiserror::Error;

/// Plugin result type
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors raised while registering factories or building beans
#[derive(Error, Debug)]
pub enum PluginError {
    /// No factory registered under this id
    #[error("Factory '{id}' not found")]
    FactoryNotFound { id: String },

    /// Factory id registered twice
    #[error("Factory '{id}' already exists")]
    FactoryAlreadyExists { id: String },

    /// Factory failed to build a bean
    #[error("Factory '{factory}' failed to create bean '{instance}': {reason}")]
    CreationFailed {
        factory: String,
        instance: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PluginError {
    /// Create a new factory not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::FactoryNotFound { id: id.into() }
    }

    /// Create a new creation failed error
    pub fn creation_failed(
        factory: impl Into<String>,
        instance: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::CreationFailed {
            factory: factory.into(),
            instance: instance.into(),
            reason: reason.into(),
        }
    }
}
