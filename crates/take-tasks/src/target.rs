//! Target descriptors

use std::fmt;
use std::sync::Arc;

use take_core::config::{MatchKind, PathRule};
use take_core::{Action, ActionContext, Environment, Namespace, TargetSpec};
use tracing::debug;

use crate::error::TaskError;
use crate::registry::{GlobMatcher, TargetRegistry};
use crate::shell::ShellAction;
use crate::staleness;

/// What happened when a target was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// The action ran, or there was no action and the gate passed
    Ran,
    /// Outputs were up to date, the action was skipped
    UpToDate,
}

/// A target built from a [`TargetSpec`]. Immutable once built.
pub struct Target {
    name: String,
    namespace: Namespace,
    match_kind: MatchKind,
    desc: Option<String>,
    deps: Vec<Namespace>,
    parallel_deps: bool,
    inputs: Vec<String>,
    outputs: Vec<String>,
    directories: Vec<String>,
    action: Option<Arc<dyn Action>>,
    children: TargetRegistry,
}

impl Target {
    /// Build a target declared under `path`, along with all of its children
    pub fn new(
        name: &str,
        spec: &TargetSpec,
        env: &Environment,
        path: &Namespace,
        matcher: &Arc<dyn GlobMatcher>,
    ) -> Result<Self, TaskError> {
        validate_name(name, env, path)?;

        // the default target lives at the root itself
        let namespace = if name.is_empty() {
            path.clone()
        } else {
            path.child(name)
        };

        let base = if env.options().all_deps_absolute {
            env.root().clone()
        } else {
            namespace.clone()
        };

        let mut deps = Vec::new();
        if spec.dep_parent && !path.is_root() {
            deps.push(path.clone());
        }
        for dep in spec.dep_list() {
            if dep.is_empty() {
                return Err(TaskError::EmptyDependencySpec {
                    target: namespace.to_string(),
                });
            }
            deps.push(base.resolve(&dep)?);
        }

        let templates = |rule: &Option<PathRule>| {
            rule.as_ref()
                .map(|r| r.templates(name))
                .unwrap_or_default()
        };

        let action = match (&spec.execute, &spec.run) {
            (Some(action), _) => Some(Arc::clone(action)),
            (None, Some(run)) => Some(Arc::new(ShellAction::new(
                run.to_vec(),
                env.options().shell.clone(),
            )) as Arc<dyn Action>),
            (None, None) => None,
        };

        let children =
            TargetRegistry::build_at(&spec.children, env, &namespace, Arc::clone(matcher))?;

        debug!(
            target_name = %namespace,
            kind = spec.match_kind.as_str(),
            deps = deps.len(),
            children = children.len(),
            "built target"
        );

        Ok(Self {
            name: name.to_string(),
            namespace,
            match_kind: spec.match_kind,
            desc: spec.desc.clone(),
            deps,
            parallel_deps: spec.parallel_deps,
            inputs: templates(&spec.files.input),
            outputs: templates(&spec.files.output),
            directories: templates(&spec.directories),
            action,
            children,
        })
    }

    /// The name (or pattern) the target was declared with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace the target was declared at
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn match_kind(&self) -> MatchKind {
        self.match_kind
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    /// Resolved dependencies. Names may still contain `$n` tokens that are
    /// filled in from the match data when the target runs.
    pub fn deps(&self) -> &[Namespace] {
        &self.deps
    }

    pub fn parallel_deps(&self) -> bool {
        self.parallel_deps
    }

    /// Whether the target has an action to run
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Nested targets
    pub fn children(&self) -> &TargetRegistry {
        &self.children
    }

    /// Run the staleness gate and then the action.
    ///
    /// Directories are created and inputs checked even when there is no
    /// action.
    pub async fn invoke(
        &self,
        ctx: &ActionContext,
        args: &[String],
    ) -> Result<Invocation, TaskError> {
        let label = ctx.namespace.to_string();

        let dirs = staleness::expand_paths(&self.directories, &ctx.matched);
        staleness::create_directories(&label, &dirs).await?;

        let inputs = staleness::expand_paths(&self.inputs, &ctx.matched);
        let outputs = staleness::expand_paths(&self.outputs, &ctx.matched);
        if !staleness::needs_run(&label, &inputs, &outputs).await? {
            debug!(target_name = %label, "outputs up to date");
            return Ok(Invocation::UpToDate);
        }

        if let Some(action) = &self.action {
            action
                .execute(ctx, args)
                .await
                .map_err(|e| TaskError::ActionFailed {
                    target: label,
                    message: format!("{e:#}"),
                })?;
        }

        Ok(Invocation::Ran)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("namespace", &self.namespace.to_string())
            .field("match_kind", &self.match_kind)
            .field("deps", &self.deps)
            .field("parallel_deps", &self.parallel_deps)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

fn validate_name(name: &str, env: &Environment, path: &Namespace) -> Result<(), TaskError> {
    let syntax = env.root().syntax();
    let invalid = |reason: String| TaskError::InvalidTargetName {
        name: path.child(name).to_string(),
        reason,
    };

    if name.is_empty() && !path.is_root() {
        return Err(invalid(
            "empty target names are only allowed at the root".to_string(),
        ));
    }
    if name.contains(syntax.separator.as_str()) {
        return Err(invalid(format!(
            "names cannot contain the namespace separator '{}'",
            syntax.separator
        )));
    }
    if name == syntax.parent {
        return Err(invalid(format!(
            "'{}' is reserved for the parent namespace",
            syntax.parent
        )));
    }
    Ok(())
}
