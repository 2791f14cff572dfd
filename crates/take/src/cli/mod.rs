//! CLI definition and command handling

pub mod commands;
pub mod output;
mod project;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{CompletionsCommand, DepsCommand, ListCommand, RunCommand};

pub use project::Project;

/// Serialises tests that change the process working directory
#[cfg(test)]
pub(crate) static CWD_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Take - run namespaced targets from a Takefile
#[derive(Debug, Parser)]
#[command(name = "take")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Path to the Takefile, skipping discovery
    #[arg(short, long, global = true, env = "TAKEFILE")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run targets in order (the default target when none are given)
    Run(RunCommand),

    /// List the targets declared in the Takefile
    List(ListCommand),

    /// Show the dependency tree of a target
    Deps(DepsCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Run(ref cmd) => cmd.execute(&self),
            Commands::List(ref cmd) => cmd.execute(&self),
            Commands::Deps(ref cmd) => cmd.execute(&self),
            Commands::Completions(ref cmd) => cmd.execute(&self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_globals() {
        let cli = Cli::try_parse_from([
            "take", "-v", "-C", "project", "run", "build", ":docs:html[pdf]", "--format", "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.directory, Some(PathBuf::from("project")));
        match cli.command {
            Commands::Run(run) => assert_eq!(run.targets, vec!["build", ":docs:html[pdf]"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_run_without_targets() {
        let cli = Cli::try_parse_from(["take", "run"]).unwrap();
        match cli.command {
            Commands::Run(run) => assert!(run.targets.is_empty()),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["take", "-q", "-v", "list"]).is_err());
    }
}
