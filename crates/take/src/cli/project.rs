//! Loading the Takefile and building its targets

use std::path::{Path, PathBuf};

use anyhow::Context;
use take_core::config::{load_takefile, load_takefile_from_dir};
use take_core::Environment;
use take_tasks::TargetRegistry;
use tracing::info;

/// A loaded Takefile with its built targets
pub struct Project {
    /// Path of the Takefile
    pub path: PathBuf,
    pub env: Environment,
    pub registry: TargetRegistry,
}

impl Project {
    /// Load an explicit Takefile, or discover one from `start_dir` upwards
    pub fn load(file: Option<&Path>, start_dir: &Path) -> anyhow::Result<Self> {
        let (takefile, path) = match file {
            Some(file) => (load_takefile(file)?, file.to_path_buf()),
            None => load_takefile_from_dir(start_dir)?,
        };

        let env = Environment::new(takefile.options)?;
        let registry = TargetRegistry::build(&takefile.targets, &env)
            .with_context(|| format!("Invalid targets in {}", path.display()))?;

        info!(path = %path.display(), targets = registry.len(), "project loaded");
        Ok(Self {
            path,
            env,
            registry,
        })
    }

    /// Load the `-f` Takefile, or discover one from the current working directory
    pub fn from_cli(file: Option<&Path>) -> anyhow::Result<Self> {
        match file {
            Some(file) => Self::load(Some(file), file.parent().unwrap_or(Path::new("."))),
            None => {
                let cwd =
                    std::env::current_dir().context("Failed to read the current directory")?;
                Self::load(None, &cwd)
            }
        }
    }

    /// Directory containing the Takefile. Targets run relative to it.
    pub fn root_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}
