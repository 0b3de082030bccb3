//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for module configurations with cross-field checks
///
/// Validation is explicit: factories call it before building a bean, so a
/// facade can still be constructed while unrelated keys are unset.
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;
}

/// Create a validation error for a canonical key
pub fn validation_error(key: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        key: key.into(),
        message: message.into(),
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, key: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(validation_error(key, "cannot be empty"));
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, key: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(validation_error(key, format!("must be greater than 0, got {}", value)));
    }
    Ok(())
}

/// Validate that a number lies within an inclusive range
pub fn validate_range<T>(value: T, min: T, max: T, key: &str) -> ConfigResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(validation_error(
            key,
            format!("must be between {} and {}, got {}", min, max, value),
        ));
    }
    Ok(())
}

/// Validate an http(s) endpoint
pub fn validate_http_url(value: &str, key: &str) -> ConfigResult<()> {
    validate_required_string(value, key)?;

    let url = url::Url::parse(value)
        .map_err(|e| validation_error(key, format!("has invalid URL format: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(validation_error(key, format!("must be an http(s) URL, got '{}'", value)));
    }
    if url.host_str().unwrap_or_default().is_empty() {
        return Err(validation_error(key, format!("must name a host, got '{}'", value)));
    }
    Ok(())
}
