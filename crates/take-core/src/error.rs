//! Error types for Take

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using TakeError
pub type Result<T> = std::result::Result<T, TakeError>;

/// Main error type for Take core operations
#[derive(Debug, Error)]
pub enum TakeError {
    /// Namespace-related errors
    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Namespace construction errors
#[derive(Debug, Error)]
pub enum NamespaceError {
    /// The spec has unbalanced or misplaced argument brackets
    #[error("'{spec}' is an invalid target name: {reason}")]
    Malformed { spec: String, reason: String },
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Takefile not found
    #[error("Unable to locate a Takefile from {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading Takefile: {0}")]
    Io(#[from] std::io::Error),
}

impl NamespaceError {
    pub(crate) fn malformed(spec: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}
