//! Execution environment shared by everything built from one Takefile

use crate::config::{validate_options, Options};
use crate::error::{NamespaceError, Result};
use crate::namespace::Namespace;

/// Validated options plus the root namespace they describe
#[derive(Debug, Clone)]
pub struct Environment {
    options: Options,
    root: Namespace,
}

impl Environment {
    /// Create an environment from options, validating them first
    pub fn new(options: Options) -> Result<Self> {
        validate_options(&options)?;
        let root = Namespace::root(options.syntax());
        Ok(Self { options, root })
    }

    /// The options this environment was built from
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The root namespace
    pub fn root(&self) -> &Namespace {
        &self.root
    }

    /// Resolve a spec from the root namespace
    pub fn resolve(&self, spec: &str) -> std::result::Result<Namespace, NamespaceError> {
        self.root.resolve(spec)
    }
}

impl Default for Environment {
    fn default() -> Self {
        let options = Options::default();
        let root = Namespace::root(options.syntax());
        Self { options, root }
    }
}
