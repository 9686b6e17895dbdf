//! Error types for the objmodel model layer
//!
//! Load, validate and dump failures are [`ValidationError`]s from the
//! schema engine. Everything else (bad definitions, unreadable text input,
//! bad keyword arguments) gets its own variant here.

use objmodel_schema::{SchemaError, ValidationError};
use thiserror::Error;

/// Main error type for model operations
#[derive(Error, Debug)]
pub enum ModelError {
    /// Input failed validation; carries the per-field detail
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The model definition could not be turned into a schema
    #[error("Invalid model definition for {model}: {source}")]
    Definition {
        model: String,
        #[source]
        source: SchemaError,
    },

    /// A post-load hook replaced the constructed instance with something else
    #[error("Could not construct {model}: {message}")]
    Construction { model: String, message: String },

    /// A meta keyword (`context`, `partial`, `many`, `unknown`) had the wrong shape
    #[error("Invalid keyword argument '{keyword}': {message}")]
    Keyword { keyword: String, message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// YAML parsing and serialization errors
    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// INI text could not be parsed
    #[error("INI parse error at line {line}: {message}")]
    Ini { line: usize, message: String },

    /// Dumped data has a value INI cannot hold
    #[error("Cannot write '{key}' as INI: {message}")]
    IniValue { key: String, message: String },
}

impl ModelError {
    /// The validation detail, when this is a validation failure
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ModelError::Validation(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ModelError::Validation(_))
    }
}

/// Convenience type alias for Results using our error type
pub type Result<T> = std::result::Result<T, ModelError>;

// Conversion implementations
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for ModelError {
    fn from(err: serde_yaml::Error) -> Self {
        ModelError::Yaml {
            message: err.to_string(),
            source: err,
        }
    }
}
