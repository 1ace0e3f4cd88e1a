//! Error types for translation handling.

use std::path::PathBuf;

use glossa_core::CoreError;
use thiserror::Error;

/// Result type for i18n operations.
pub type Result<T> = std::result::Result<T, I18nError>;

/// Translation errors.
#[derive(Debug, Error)]
pub enum I18nError {
    /// Core error, e.g. an unknown language.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A translation file exists but is not a flat key-value mapping.
    #[error("malformed translation file {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Directory traversal error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl I18nError {
    /// Create a malformed-file error.
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}
