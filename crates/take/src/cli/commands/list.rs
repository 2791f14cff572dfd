//! List command: show the declared targets

use clap::Args;
use console::style;
use serde_json::{json, Value};
use take_core::config::MatchKind;
use take_tasks::TargetRegistry;

use crate::cli::{output, Cli, OutputFormat, Project};

/// List the targets declared in the Takefile
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Also show each target's dependencies
    #[arg(long)]
    pub deps: bool,
}

impl ListCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let project = Project::from_cli(cli.file.as_deref())?;

        if cli.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&targets_json(&project.registry))?);
            return Ok(());
        }

        if project.registry.is_empty() {
            output::warning(&format!("No targets declared in {}", project.path.display()));
            return Ok(());
        }

        if !cli.quiet {
            println!("{}", output::header(&format!("Targets in {}", project.path.display())));
        }
        for line in tree_lines(&project.registry, 0, self.deps) {
            println!("{line}");
        }
        if !cli.quiet {
            println!();
            output::legend();
        }
        Ok(())
    }
}

/// Render a registry level as indented lines
fn tree_lines(registry: &TargetRegistry, depth: usize, show_deps: bool) -> Vec<String> {
    let indent = "  ".repeat(depth + 1);
    let mut lines = Vec::new();

    for target in registry.targets() {
        let mut line = format!(
            "{}{}",
            indent,
            output::target_style(target).apply_to(output::target_label(target))
        );
        if target.match_kind() != MatchKind::Exact {
            line.push_str(&format!(" {}", style(format!("[{}]", target.match_kind().as_str())).cyan()));
        }
        if let Some(desc) = target.desc() {
            line.push_str(&format!("  {}", style(desc).dim()));
        }
        lines.push(line);

        if show_deps {
            for dep in target.deps() {
                lines.push(format!(
                    "{}  {} {}",
                    indent,
                    style("←").dim(),
                    dep.to_string_with_args(true)
                ));
            }
        }

        lines.extend(tree_lines(target.children(), depth + 1, show_deps));
    }

    lines
}

/// JSON description of a registry level and everything below it
fn targets_json(registry: &TargetRegistry) -> Value {
    registry
        .targets()
        .map(|target| {
            json!({
                "name": target.name(),
                "namespace": target.namespace().to_string(),
                "match": target.match_kind().as_str(),
                "desc": target.desc(),
                "deps": target
                    .deps()
                    .iter()
                    .map(|d| d.to_string_with_args(true))
                    .collect::<Vec<_>>(),
                "parallelDeps": target.parallel_deps(),
                "action": target.has_action(),
                "children": targets_json(target.children()),
            })
        })
        .collect()
}
