//! Run command: execute targets in order

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::{info, warn};

use take_tasks::{Runner, TaskEvent, TaskReporter, TaskReporterRegistry};

use crate::cli::{Cli, OutputFormat, Project};

/// Run targets from the Takefile
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Targets to run in order, e.g. `build` or `:docs:html[pdf]`.
    /// Runs the default target when empty.
    pub targets: Vec<String>,
}

impl RunCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute_async(cli))
    }

    /// The target specs to run; the default target when none were given
    fn specs(&self) -> Vec<String> {
        if self.targets.is_empty() {
            vec![String::new()]
        } else {
            self.targets.clone()
        }
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let project = Project::from_cli(cli.file.as_deref())?;
        let _cwd = WorkingDir::enter(project.root_dir())?;

        // resolve everything up front so a typo fails before anything runs
        let namespaces = self
            .specs()
            .iter()
            .map(|spec| project.env.resolve(spec))
            .collect::<Result<Vec<_>, _>>()?;

        let mut reporters = TaskReporterRegistry::new();
        if !cli.quiet && cli.format != OutputFormat::Json {
            reporters.register(Arc::new(ConsoleReporter::new(cli.verbose)));
        }
        let runner = Runner::new(project.registry).with_reporter(Arc::new(reporters));

        info!(targets = namespaces.len(), takefile = %project.path.display(), "running targets");
        let start = Instant::now();
        let mut results = Vec::new();
        let mut failure = None;

        for namespace in &namespaces {
            let target_start = Instant::now();
            let mut entry = serde_json::json!({
                "target": namespace.to_string_with_args(true),
            });

            match runner.execute(namespace).await {
                Ok(summary) => {
                    entry["status"] = "success".into();
                    entry["executed"] = summary.executed.into();
                    entry["up_to_date"] = summary.up_to_date.into();
                }
                Err(err) => {
                    entry["status"] = "failed".into();
                    entry["error"] = err.to_string().into();
                    failure = Some(err);
                }
            }
            entry["duration_ms"] = (target_start.elapsed().as_millis() as u64).into();
            results.push(entry);

            if failure.is_some() {
                break;
            }
        }

        if cli.format == OutputFormat::Json {
            let summary = serde_json::json!({
                "success": failure.is_none(),
                "duration_ms": start.elapsed().as_millis() as u64,
                "targets": results,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        match failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

/// Switches the process into a directory and back again when dropped
struct WorkingDir {
    previous: Option<PathBuf>,
}

impl WorkingDir {
    fn enter(dir: &Path) -> anyhow::Result<Self> {
        let previous = std::env::current_dir().ok();
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to enter {}", dir.display()))?;
        Ok(Self { previous })
    }
}

impl Drop for WorkingDir {
    fn drop(&mut self) {
        if let Some(previous) = &self.previous {
            if let Err(err) = std::env::set_current_dir(previous) {
                warn!(dir = %previous.display(), error = %err, "failed to restore working directory");
            }
        }
    }
}

/// Console reporter with styled progress lines
struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TaskReporter for ConsoleReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::RunStarted { namespace, targets } => {
                println!(
                    "{} {} {}",
                    style("→").blue(),
                    style(namespace).bold(),
                    style(format!(
                        "({} target{})",
                        targets,
                        if *targets == 1 { "" } else { "s" }
                    ))
                    .dim()
                );
            }
            TaskEvent::Started { target } => {
                if self.verbose {
                    println!("  {} {}", style("▸").dim(), style(target).bold());
                }
            }
            TaskEvent::Completed { target, duration } => {
                println!(
                    "  {} {} {}",
                    style("✓").green(),
                    style(target).green(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim()
                );
            }
            TaskEvent::UpToDate { target } => {
                println!(
                    "  {} {} {}",
                    style("○").yellow(),
                    style(target).yellow(),
                    style("(up to date)").dim()
                );
            }
            TaskEvent::Failed {
                target,
                duration,
                error,
            } => {
                println!(
                    "  {} {} {} {}",
                    style("✗").red(),
                    style(target).red(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim(),
                    style(error).red().dim()
                );
            }
            TaskEvent::RunCompleted {
                namespace,
                executed,
                up_to_date,
                duration,
            } => {
                println!(
                    "{} {} done: {} ran, {} up to date ({:.1}s)",
                    style("✓").green().bold(),
                    namespace,
                    executed,
                    up_to_date,
                    duration.as_secs_f64()
                );
            }
        }
    }
}
