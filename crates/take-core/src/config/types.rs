//! Configuration types

use std::fmt;
use std::sync::Arc;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::action::Action;
use crate::namespace::NamespaceSyntax;

use super::defaults::{DEFAULT_NAMESPACE_PARENT, DEFAULT_NAMESPACE_SEPARATOR, DEFAULT_SHELL};

/// A parsed Takefile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Takefile {
    /// Execution options
    pub options: Options,

    /// The declared targets
    pub targets: TargetTree,
}

/// Options controlling namespace resolution and command execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Separator between namespace names
    pub namespace_separator: String,

    /// Name that refers to the parent namespace
    pub namespace_parent: String,

    /// Resolve every dependency from the root rather than from its target
    pub all_deps_absolute: bool,

    /// Defaults for shell command execution
    pub shell: ShellOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            namespace_separator: DEFAULT_NAMESPACE_SEPARATOR.to_string(),
            namespace_parent: DEFAULT_NAMESPACE_PARENT.to_string(),
            all_deps_absolute: false,
            shell: ShellOptions::default(),
        }
    }
}

impl Options {
    /// The namespace syntax described by these options
    pub fn syntax(&self) -> NamespaceSyntax {
        NamespaceSyntax::new(&self.namespace_separator, &self.namespace_parent)
    }
}

/// Options for running shell commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShellOptions {
    /// Echo each command before running it
    pub echo: bool,

    /// Prefix printed before an echoed command
    pub echo_prefix: String,

    /// Suffix printed after an echoed command
    pub echo_suffix: String,

    /// Fail the target when a command exits with a non-zero code
    pub abort_on_error_code: bool,

    /// Print the command's stdout
    pub print_stdout: bool,

    /// Print the command's stderr
    pub print_stderr: bool,

    /// Program used to run command strings (`<shell> -c <command>`)
    pub shell: String,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            echo: false,
            echo_prefix: "> ".to_string(),
            echo_suffix: String::new(),
            abort_on_error_code: true,
            print_stdout: false,
            print_stderr: false,
            shell: DEFAULT_SHELL.to_string(),
        }
    }
}

/// How a target's name is matched against a namespace name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Literal name
    #[default]
    Exact,
    /// `/pattern/flags` regular expression literal
    Regex,
    /// Shell-style glob pattern
    Glob,
}

impl MatchKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Regex => "regex",
            Self::Glob => "glob",
        }
    }
}

/// A single string or a list of strings.
///
/// Bare numbers and booleans are read as their text, so `deps: 1` names the
/// target `1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "RawOneOrMany")]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOneOrMany {
    One(Scalar),
    Many(Vec<Scalar>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Text(text) => text,
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

impl From<RawOneOrMany> for OneOrMany {
    fn from(raw: RawOneOrMany) -> Self {
        match raw {
            RawOneOrMany::One(value) => Self::One(value.into()),
            RawOneOrMany::Many(values) => Self::Many(values.into_iter().map(String::from).collect()),
        }
    }
}

impl OneOrMany {
    /// Get the values as a list
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

/// A path rule: `true` uses the target's own name, `false` means none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathRule {
    Flag(bool),
    One(String),
    Many(Vec<String>),
}

impl PathRule {
    /// Get the path templates this rule declares for a target name
    pub fn templates(&self, target_name: &str) -> Vec<String> {
        match self {
            Self::Flag(true) => vec![target_name.to_string()],
            Self::Flag(false) => Vec::new(),
            Self::One(path) => vec![path.clone()],
            Self::Many(paths) => paths.clone(),
        }
    }
}

/// Input and output file rules of a target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRules {
    /// Files that must exist before the target runs
    pub input: Option<PathRule>,

    /// Files the target produces
    pub output: Option<PathRule>,
}

/// Declarative definition of a single target
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetSpec {
    /// How the target's name is matched
    #[serde(rename = "match")]
    pub match_kind: MatchKind,

    /// Description
    pub desc: Option<String>,

    /// Namespaces that must run before this target
    pub deps: Option<OneOrMany>,

    /// Whether dependencies may run concurrently
    pub parallel_deps: bool,

    /// Nested targets
    pub children: TargetTree,

    /// Depend on the parent namespace's target
    pub dep_parent: bool,

    /// File staleness rules
    pub files: FileRules,

    /// Directories created before the target runs
    pub directories: Option<PathRule>,

    /// Shell commands to run
    pub run: Option<OneOrMany>,

    /// Programmatic action, takes priority over `run`
    #[serde(skip)]
    pub execute: Option<Arc<dyn Action>>,
}

impl TargetSpec {
    /// Create an empty target spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the description
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    /// Set how the name is matched
    pub fn with_match(mut self, kind: MatchKind) -> Self {
        self.match_kind = kind;
        self
    }

    /// Add a dependency spec
    pub fn with_dep(mut self, dep: impl Into<String>) -> Self {
        let mut deps = self.dep_list();
        deps.push(dep.into());
        self.deps = Some(OneOrMany::Many(deps));
        self
    }

    /// Set whether dependencies run concurrently
    pub fn with_parallel_deps(mut self, parallel: bool) -> Self {
        self.parallel_deps = parallel;
        self
    }

    /// Set whether the target depends on its parent
    pub fn with_dep_parent(mut self, dep_parent: bool) -> Self {
        self.dep_parent = dep_parent;
        self
    }

    /// Add a child target
    pub fn with_child(mut self, name: impl Into<String>, spec: TargetSpec) -> Self {
        self.children.insert(name, spec);
        self
    }

    /// Set the input file rule
    pub fn with_inputs(mut self, rule: PathRule) -> Self {
        self.files.input = Some(rule);
        self
    }

    /// Set the output file rule
    pub fn with_outputs(mut self, rule: PathRule) -> Self {
        self.files.output = Some(rule);
        self
    }

    /// Set the directory rule
    pub fn with_directories(mut self, rule: PathRule) -> Self {
        self.directories = Some(rule);
        self
    }

    /// Set the shell command(s) to run
    pub fn with_run(mut self, run: OneOrMany) -> Self {
        self.run = Some(run);
        self
    }

    /// Set the programmatic action
    pub fn with_execute(mut self, action: Arc<dyn Action>) -> Self {
        self.execute = Some(action);
        self
    }

    /// The declared dependency specs, in order
    pub fn dep_list(&self) -> Vec<String> {
        self.deps.as_ref().map(OneOrMany::to_vec).unwrap_or_default()
    }
}

/// An ordered map of target names to target specs.
///
/// Declaration order matters: regex and glob targets are tried in the order
/// they were declared.
#[derive(Debug, Clone, Default)]
pub struct TargetTree {
    entries: Vec<(String, TargetSpec)>,
}

impl TargetTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target, replacing any earlier target with the same name
    pub fn insert(&mut self, name: impl Into<String>, spec: TargetSpec) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = spec,
            None => self.entries.push((name, spec)),
        }
    }

    /// Add a target (builder style)
    pub fn with(mut self, name: impl Into<String>, spec: TargetSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Get a target spec by name
    pub fn get(&self, name: &str) -> Option<&TargetSpec> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    /// Iterate over the targets in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetSpec)> {
        self.entries.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Number of targets at this level
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no targets at this level
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for TargetTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TreeVisitor;

        impl<'de> Visitor<'de> for TreeVisitor {
            type Value = TargetTree;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of target names to targets")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TargetTree, A::Error> {
                let mut tree = TargetTree::new();
                while let Some((name, spec)) = map.next_entry::<Scalar, TargetSpec>()? {
                    tree.insert(String::from(name), spec);
                }
                Ok(tree)
            }
        }

        deserializer.deserialize_map(TreeVisitor)
    }
}
