//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Options;

/// Validate execution options
pub fn validate_options(options: &Options) -> Result<()> {
    debug!("validating options");

    if options.namespace_separator.is_empty() {
        return Err(invalid("namespaceSeparator", "separator cannot be empty"));
    }

    if options.namespace_parent.is_empty() {
        return Err(invalid("namespaceParent", "parent directive cannot be empty"));
    }

    if options.namespace_parent.contains(&options.namespace_separator) {
        return Err(invalid(
            "namespaceParent",
            "parent directive cannot contain the namespace separator",
        ));
    }

    if options.shell.shell.trim().is_empty() {
        return Err(invalid("shell.shell", "shell program cannot be empty"));
    }

    Ok(())
}

fn invalid(field: &str, message: &str) -> crate::error::TakeError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}
