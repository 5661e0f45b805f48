//! Error types for PromQL Language Tools
//!
//! Only the edges of the crate can fail: building a definitions registry
//! and loading definition tables. Position classification and completion
//! are best-effort and never return errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when using PromQL Language Tools
#[derive(Debug, Error)]
pub enum Error {
    /// Two definitions in the same table share a name
    #[error("Duplicate {table} definition '{name}'")]
    DuplicateDefinition { table: &'static str, name: String },

    /// A definition is structurally unusable
    #[error("Invalid definition '{name}': {message}")]
    InvalidDefinition { name: String, message: String },

    /// The definitions file could not be read
    #[error("Failed to read definitions from {path}: {message}")]
    DefinitionsRead { path: PathBuf, message: String },

    /// The trailing-operator pattern failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a definitions read failure error
    #[must_use]
    pub fn definitions_read(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::DefinitionsRead {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create an invalid definition error
    #[must_use]
    pub fn invalid_definition(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            message: message.into(),
        }
    }
}
