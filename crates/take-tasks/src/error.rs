//! Errors raised while building and running targets

use std::path::PathBuf;

use take_core::NamespaceError;

/// Errors during registry construction, dependency resolution and execution
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// A dependency or requested name is not a valid namespace spec
    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    /// Target name breaks the naming rules
    #[error("Invalid target name '{name}': {reason}")]
    InvalidTargetName { name: String, reason: String },

    /// Regex target key is not a usable `/pattern/flags` literal
    #[error("'{literal}' is not a valid regex literal: {reason}")]
    InvalidRegexLiteral { literal: String, reason: String },

    /// Dependency declared as an empty string
    #[error("Target '{target}' has an empty dependency")]
    EmptyDependencySpec { target: String },

    /// Dependency that resolves to the root namespace
    #[error("'{dependency}' is not a valid dependency of '{target}'")]
    InvalidDependency { target: String, dependency: String },

    /// No target matches the namespace
    #[error("Unable to find target {0}")]
    TargetNotFound(String),

    /// The requested dependency tree contains a cycle
    #[error("Cyclic target dependency detected, aborting: {0}")]
    CyclicDependency(String),

    /// A declared input file does not exist
    #[error("Target '{target}': input file {} could not be found", path.display())]
    MissingInputFile { target: String, path: PathBuf },

    /// Filesystem error while checking files or creating directories
    #[error("Target '{target}': IO error on {}: {source}", path.display())]
    Io {
        target: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target's action failed
    #[error("Target '{target}' failed: {message}")]
    ActionFailed { target: String, message: String },
}

impl TaskError {
    /// Whether this error was raised while building targets, before anything ran
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidTargetName { .. }
                | Self::InvalidRegexLiteral { .. }
                | Self::EmptyDependencySpec { .. }
                | Self::Namespace(_)
        )
    }
}
