//! Takefile loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::takefile_names;
use super::types::Takefile;
use super::validation::validate_options;

/// Load a Takefile from a path. Files ending in `.toml` are parsed as TOML,
/// everything else as YAML.
pub fn load_takefile(path: &Path) -> Result<Takefile> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading Takefile");

    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let takefile: Takefile = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::Toml)?
    } else if content.trim().is_empty() {
        Takefile::default()
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::Yaml)?
    };

    validate_options(&takefile.options)?;
    debug!(
        path = %path.display(),
        targets = takefile.targets.len(),
        "Takefile loaded and validated"
    );
    Ok(takefile)
}

/// Find a Takefile in a directory or its parent directories.
///
/// The candidate names are checked in priority order at each level; the
/// first match wins. Parents are walked until the filesystem root.
pub fn find_takefile(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for Takefile");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in takefile_names() {
            let path = current.join(name);
            if path.is_file() {
                info!(path = %path.display(), "found Takefile");
                return Some(path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no Takefile found");
    None
}

/// Load a Takefile from a directory (searching parent directories)
pub fn load_takefile_from_dir(dir: &Path) -> Result<(Takefile, PathBuf)> {
    let path = find_takefile(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let takefile = load_takefile(&path)?;
    Ok((takefile, path))
}
