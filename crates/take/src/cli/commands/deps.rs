//! Deps command: show the dependency tree of a target

use clap::Args;
use console::style;
use serde_json::{json, Value};
use take_tasks::{build_graph, DependencyNode};

use crate::cli::{output, Cli, OutputFormat, Project};

/// Show what a target would run, in order
#[derive(Debug, Args)]
pub struct DepsCommand {
    /// Target to inspect (the default target when omitted)
    pub target: Option<String>,
}

impl DepsCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let project = Project::from_cli(cli.file.as_deref())?;
        let namespace = project.env.resolve(self.target.as_deref().unwrap_or_default())?;
        let (node, safe) = build_graph(&project.registry, &namespace)?;

        if cli.format == OutputFormat::Json {
            let value = json!({
                "safe": safe,
                "tree": node_json(&node),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        for line in node_lines(&node, 0) {
            println!("{line}");
        }
        if !safe {
            output::warning("This target has a cyclic dependency and cannot run");
        }
        if !cli.quiet {
            println!();
            output::legend();
            println!(
                "{} {}",
                style("already run").dim(),
                style("cyclic").red()
            );
        }
        Ok(())
    }
}

/// Render a node and its dependencies, deepest first
fn node_lines(node: &DependencyNode, depth: usize) -> Vec<String> {
    let indent = "  ".repeat(depth);
    let mut lines = Vec::new();

    let name = if node.cyclic {
        format!("{} {}", style(&node.name).red(), style("(cyclic)").red().dim())
    } else if !node.execute {
        format!("{} {}", style(&node.name).dim(), style("(already run)").dim())
    } else {
        output::target_style(&node.target)
            .apply_to(&node.name)
            .to_string()
    };
    lines.push(format!("{indent}{name}"));

    for child in &node.children {
        lines.extend(node_lines(child, depth + 1));
    }
    lines
}

fn node_json(node: &DependencyNode) -> Value {
    json!({
        "name": node.name,
        "execute": node.execute,
        "cyclic": node.cyclic,
        "args": node.args,
        "matched": node.matched,
        "children": node.children.iter().map(node_json).collect::<Vec<_>>(),
    })
}
