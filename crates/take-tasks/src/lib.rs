//! Take Tasks - Target execution engine
//!
//! This crate builds the target registry from a declarative target tree,
//! resolves dependency graphs, and runs targets with file-based staleness
//! checks, sequential or concurrent dependencies, and progress reporting.

pub mod error;
pub mod graph;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod shell;
pub mod staleness;
pub mod target;

pub use error::TaskError;
pub use graph::{build_graph, DependencyNode};
pub use registry::{GlobMatcher, PatternMatcher, Resolved, TargetRegistry};
pub use reporter::{
    CollectingReporter, TaskEvent, TaskReporter, TaskReporterRegistry, TracingReporter,
};
pub use runner::{RunSummary, Runner};
pub use shell::ShellAction;
pub use target::{Invocation, Target};
