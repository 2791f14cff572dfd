//! Dependency graph construction
//!
//! The graph is built fresh for every requested namespace. A target that
//! already appeared earlier in the same build is kept as a node that does not
//! execute. A node whose namespace is one of its own ancestors is cyclic and
//! makes the whole graph unsafe to run.

use std::collections::HashSet;
use std::sync::Arc;

use take_core::Namespace;
use tracing::{debug, instrument};

use crate::error::TaskError;
use crate::registry::TargetRegistry;
use crate::target::Target;

/// A node of the dependency graph
#[derive(Debug)]
pub struct DependencyNode {
    /// Canonical namespace, with arguments
    pub name: String,
    pub namespace: Namespace,
    pub target: Arc<Target>,
    pub matched: Vec<String>,
    pub args: Vec<String>,
    /// Dependencies, in declaration order
    pub children: Vec<DependencyNode>,
    /// False when the target already appeared earlier in this build
    pub execute: bool,
    /// True when the namespace is one of its own ancestors
    pub cyclic: bool,
}

impl DependencyNode {
    /// Number of nodes that will run, including this one
    pub fn execution_count(&self) -> usize {
        if !self.execute {
            return 0;
        }
        1 + self
            .children
            .iter()
            .map(DependencyNode::execution_count)
            .sum::<usize>()
    }
}

/// Build the dependency graph for a namespace.
///
/// Returns the root node and whether the graph is free of cycles.
#[instrument(skip_all, fields(namespace = %namespace))]
pub fn build_graph(
    registry: &TargetRegistry,
    namespace: &Namespace,
) -> Result<(DependencyNode, bool), TaskError> {
    let mut seen = HashSet::new();
    let (node, safe) = build_node(registry, namespace, None, &[], &mut seen)?;
    debug!(nodes = seen.len(), safe, "dependency graph built");
    Ok((node, safe))
}

fn build_node(
    registry: &TargetRegistry,
    namespace: &Namespace,
    parent: Option<&Namespace>,
    ancestors: &[Namespace],
    seen: &mut HashSet<String>,
) -> Result<(DependencyNode, bool), TaskError> {
    let mut path = ancestors.to_vec();
    if let Some(parent) = parent {
        path.push(parent.clone());
    }

    let resolved = registry.find(namespace)?;

    let execute = seen.insert(namespace.to_string());
    let cyclic = path.iter().any(|a| a.equal_to(namespace, false));
    let mut safe = !cyclic;

    let mut children = Vec::new();
    for dep in resolved.target.deps() {
        let dep = dep.format(&resolved.matched);
        if dep.is_root() {
            return Err(TaskError::InvalidDependency {
                target: namespace.to_string(),
                dependency: dep.to_string_with_args(true),
            });
        }

        if execute && !cyclic {
            let (child, child_safe) = build_node(registry, &dep, Some(namespace), &path, seen)?;
            safe = safe && child_safe;
            children.push(child);
        }
    }

    if cyclic {
        debug!(namespace = %namespace, "cyclic dependency");
    }

    Ok((
        DependencyNode {
            name: namespace.to_string_with_args(true),
            namespace: namespace.clone(),
            target: resolved.target,
            matched: resolved.matched,
            args: namespace.args().to_vec(),
            children,
            execute,
            cyclic,
        },
        safe,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use take_core::config::MatchKind;
    use take_core::{Environment, TargetSpec, TargetTree};

    fn graph(tree: TargetTree, spec: &str) -> Result<(DependencyNode, bool), TaskError> {
        let env = Environment::default();
        let registry = TargetRegistry::build(&tree, &env).unwrap();
        build_graph(&registry, &env.resolve(spec).unwrap())
    }

    fn executed(node: &DependencyNode, out: &mut Vec<String>) {
        if !node.execute {
            return;
        }
        for child in &node.children {
            executed(child, out);
        }
        out.push(node.name.clone());
    }

    #[test]
    fn test_children_in_declaration_order() {
        let tree = TargetTree::new()
            .with("a", TargetSpec::new())
            .with("b", TargetSpec::new())
            .with("c", TargetSpec::new().with_dep(":b").with_dep(":a"));
        let (node, safe) = graph(tree, "c").unwrap();
        assert!(safe);
        let names: Vec<&str> = node.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec![":b", ":a"]);
        assert_eq!(node.execution_count(), 3);
    }

    #[test]
    fn test_repeated_targets_do_not_execute() {
        let tree = TargetTree::new()
            .with("a", TargetSpec::new())
            .with("b", TargetSpec::new().with_dep(":a"))
            .with("c", TargetSpec::new().with_dep(":a").with_dep(":b"));
        let (node, safe) = graph(tree, "c").unwrap();
        assert!(safe);

        let b = &node.children[1];
        assert!(b.execute);
        assert_eq!(b.children.len(), 1);
        assert!(!b.children[0].execute);

        let mut out = Vec::new();
        executed(&node, &mut out);
        assert_eq!(out, vec![":a", ":b", ":c"]);
    }

    #[test]
    fn test_dedup_ignores_arguments() {
        let tree = TargetTree::new()
            .with("a", TargetSpec::new())
            .with("b", TargetSpec::new().with_dep(":a[1]").with_dep(":a[2]"));
        let (node, _) = graph(tree, "b").unwrap();
        assert!(node.children[0].execute);
        assert_eq!(node.children[0].args, vec!["1"]);
        assert!(!node.children[1].execute);
    }

    #[test]
    fn test_cycle_is_unsafe() {
        let tree = TargetTree::new()
            .with("a", TargetSpec::new().with_dep(":b"))
            .with("b", TargetSpec::new().with_dep(":a"));
        let (node, safe) = graph(tree, "a").unwrap();
        assert!(!safe);
        let back = &node.children[0].children[0];
        assert!(back.cyclic);
        assert!(back.children.is_empty());
    }

    #[test]
    fn test_self_dependency_is_unsafe() {
        let tree = TargetTree::new().with("a", TargetSpec::new().with_dep(":a"));
        let (_, safe) = graph(tree, "a").unwrap();
        assert!(!safe);
    }

    #[test]
    fn test_diamond_is_safe() {
        let tree = TargetTree::new()
            .with("base", TargetSpec::new())
            .with("left", TargetSpec::new().with_dep(":base"))
            .with("right", TargetSpec::new().with_dep(":base"))
            .with("top", TargetSpec::new().with_dep(":left").with_dep(":right"));
        let (node, safe) = graph(tree, "top").unwrap();
        assert!(safe);
        assert_eq!(node.execution_count(), 4);
    }

    #[test]
    fn test_deps_formatted_with_match_data() {
        let tree = TargetTree::new()
            .with("compile-core", TargetSpec::new())
            .with(
                "/^test-(.*)$/",
                TargetSpec::new()
                    .with_match(MatchKind::Regex)
                    .with_dep(":compile-$1"),
            );
        let (node, safe) = graph(tree, "test-core").unwrap();
        assert!(safe);
        assert_eq!(node.children[0].name, ":compile-core");
        assert_eq!(node.matched, vec!["test-core", "core"]);
    }

    #[test]
    fn test_root_dependency_is_invalid() {
        let tree = TargetTree::new()
            .with("", TargetSpec::new())
            .with("a", TargetSpec::new().with_dep("^"));
        let err = graph(tree, "a").unwrap_err();
        assert!(matches!(err, TaskError::InvalidDependency { .. }));
    }

    #[test]
    fn test_missing_dependency() {
        let tree = TargetTree::new().with("a", TargetSpec::new().with_dep(":missing"));
        let err = graph(tree, "a").unwrap_err();
        assert!(matches!(err, TaskError::TargetNotFound(ns) if ns == ":missing"));
    }
}
