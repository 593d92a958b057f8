//! Configuration Error Types
//!
//! Errors for configuration loading and validation with enough context to
//! point at the offending file or field.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// No configuration directory could be located
    #[error("Configuration directory not found. Searched paths: {searched_paths:?}")]
    ConfigDirectoryNotFound { searched_paths: Vec<PathBuf> },

    /// Invalid TOML syntax or unreadable source
    #[error("Failed to read configuration source '{source_name}': {error}")]
    SourceError { source_name: String, error: String },

    /// Merged configuration did not match the expected shape
    #[error("Failed to deserialize configuration: {error}")]
    DeserializationError { error: String },

    /// Missing required configuration field
    #[error("Missing required configuration field '{field}' in {context}")]
    MissingRequiredField { field: String, context: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },
}

impl ConfigurationError {
    pub fn config_directory_not_found(searched_paths: Vec<PathBuf>) -> Self {
        Self::ConfigDirectoryNotFound { searched_paths }
    }

    pub fn source_error<S: Into<String>, E: std::fmt::Display>(source_name: S, error: E) -> Self {
        Self::SourceError {
            source_name: source_name.into(),
            error: error.to_string(),
        }
    }

    pub fn missing_required_field<F: Into<String>, C: Into<String>>(field: F, context: C) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
            context: context.into(),
        }
    }

    pub fn invalid_value<F, V, C>(field: F, value: V, context: C) -> Self
    where
        F: Into<String>,
        V: std::fmt::Display,
        C: Into<String>,
    {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            context: context.into(),
        }
    }
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(error: config::ConfigError) -> Self {
        match error {
            config::ConfigError::FileParse { uri, cause } => Self::SourceError {
                source_name: uri.unwrap_or_else(|| "<unknown>".to_string()),
                error: cause.to_string(),
            },
            other => Self::DeserializationError {
                error: other.to_string(),
            },
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
