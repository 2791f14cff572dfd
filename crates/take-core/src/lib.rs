//! Take Core - Core library for the Take task runner
//!
//! This crate provides the namespace algebra, the declarative target tree,
//! Takefile loading, execution options and the action interface shared by
//! the task engine and the CLI.

pub mod action;
pub mod config;
pub mod environment;
pub mod error;
pub mod namespace;

pub use action::{action, Action, ActionContext, FnAction};
pub use config::{Options, ShellOptions, TargetSpec, TargetTree, Takefile};
pub use environment::Environment;
pub use error::{ConfigError, NamespaceError, Result, TakeError};
pub use namespace::{Namespace, NamespaceSyntax};
