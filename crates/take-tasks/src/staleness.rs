//! File-based staleness checks run before a target's action

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use take_core::namespace::format_tokens;
use tracing::debug;

use crate::error::TaskError;

/// Expand path templates against a target's match data
pub fn expand_paths(templates: &[String], matched: &[String]) -> Vec<PathBuf> {
    templates
        .iter()
        .map(|template| PathBuf::from(format_tokens(template, matched)))
        .collect()
}

/// Create each directory, outermost component first.
///
/// For `a/b` this checks `a` and then `a/b`, creating whichever is missing.
pub async fn create_directories(target: &str, dirs: &[PathBuf]) -> Result<(), TaskError> {
    for dir in dirs {
        let mut current = PathBuf::new();
        for component in dir.components() {
            current.push(component);
            if is_dir(&current).await {
                continue;
            }

            debug!(target_name = target, path = %current.display(), "creating directory");
            match tokio::fs::create_dir(&current).await {
                Ok(()) => {}
                // another branch may have created it in the meantime
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(source) => {
                    return Err(TaskError::Io {
                        target: target.to_string(),
                        path: current,
                        source,
                    })
                }
            }
        }
    }
    Ok(())
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}

/// Latest modification time among the inputs. Every input must exist.
pub async fn latest_input_time(
    target: &str,
    inputs: &[PathBuf],
) -> Result<Option<SystemTime>, TaskError> {
    let mut latest: Option<SystemTime> = None;

    for input in inputs {
        let modified = match modified_time(target, input).await? {
            Some(time) => time,
            None => {
                return Err(TaskError::MissingInputFile {
                    target: target.to_string(),
                    path: input.clone(),
                })
            }
        };
        if latest.map_or(true, |l| l < modified) {
            latest = Some(modified);
        }
    }

    Ok(latest)
}

/// Decide whether a target's action has to run.
///
/// Targets without outputs always run. Otherwise the action runs when an
/// output is missing or older than the newest input.
pub async fn needs_run(
    target: &str,
    inputs: &[PathBuf],
    outputs: &[PathBuf],
) -> Result<bool, TaskError> {
    let latest = latest_input_time(target, inputs).await?;

    if outputs.is_empty() {
        return Ok(true);
    }

    for output in outputs {
        match modified_time(target, output).await? {
            None => {
                debug!(target_name = target, path = %output.display(), "output missing");
                return Ok(true);
            }
            Some(modified) if latest.is_some_and(|l| modified < l) => {
                debug!(target_name = target, path = %output.display(), "output older than inputs");
                return Ok(true);
            }
            Some(_) => {}
        }
    }

    Ok(false)
}

/// Modification time of a file, or `None` when it does not exist
async fn modified_time(target: &str, path: &Path) -> Result<Option<SystemTime>, TaskError> {
    let io_error = |source| TaskError::Io {
        target: target.to_string(),
        path: path.to_path_buf(),
        source,
    };

    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.modified().map(Some).map_err(io_error),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(e)),
    }
}
