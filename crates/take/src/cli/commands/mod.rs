//! CLI commands

mod completions;
mod deps;
mod list;
mod run;

pub use completions::CompletionsCommand;
pub use deps::DepsCommand;
pub use list::ListCommand;
pub use run::RunCommand;
