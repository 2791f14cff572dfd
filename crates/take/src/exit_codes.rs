//! Exit codes for the CLI

use take_core::{ConfigError, TakeError};
use take_tasks::TaskError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Takefile could not be found, parsed or built
pub const CONFIG_ERROR: i32 = 2;

/// A requested target could not be resolved or failed to run
pub const TARGET_ERROR: i32 = 3;

/// Pick the exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(task) = cause.downcast_ref::<TaskError>() {
            return if task.is_configuration() {
                CONFIG_ERROR
            } else {
                TARGET_ERROR
            };
        }
        if cause.is::<TakeError>() || cause.is::<ConfigError>() {
            return CONFIG_ERROR;
        }
        if cause.is::<take_core::NamespaceError>() {
            return TARGET_ERROR;
        }
    }
    ERROR
}
