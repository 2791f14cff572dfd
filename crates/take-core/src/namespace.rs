//! Hierarchical target namespaces
//!
//! A namespace is an ordered list of names plus an optional list of
//! arguments. Namespaces are resolved from textual specs such as
//! `:build:docs[html,pdf]`, where a leading separator marks the spec as
//! absolute and a configurable parent directive (`^` by default) collapses
//! the name before it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};

use crate::error::NamespaceError;

/// Positional substitution token (`$0`, `$1`, ...)
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("Invalid regex"));

/// The symbols used to write and resolve namespace specs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceSyntax {
    /// Separator between names (default `:`)
    pub separator: String,
    /// Name that refers to the parent namespace (default `^`)
    pub parent: String,
}

impl NamespaceSyntax {
    /// Create a syntax with a custom separator and parent directive
    pub fn new(separator: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            parent: parent.into(),
        }
    }
}

impl Default for NamespaceSyntax {
    fn default() -> Self {
        Self::new(":", "^")
    }
}

/// A resolved, immutable namespace
#[derive(Debug, Clone)]
pub struct Namespace {
    syntax: Arc<NamespaceSyntax>,
    names: Vec<String>,
    args: Vec<String>,
}

impl Namespace {
    /// Get the root namespace for a syntax
    pub fn root(syntax: NamespaceSyntax) -> Self {
        Self {
            syntax: Arc::new(syntax),
            names: Vec::new(),
            args: Vec::new(),
        }
    }

    fn with_names(&self, names: Vec<String>, args: Vec<String>) -> Self {
        Self {
            syntax: Arc::clone(&self.syntax),
            names,
            args,
        }
    }

    /// The syntax this namespace was resolved with
    pub fn syntax(&self) -> &NamespaceSyntax {
        &self.syntax
    }

    /// The list of names that make up this namespace
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The arguments given with this namespace
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The last name in the namespace, if any
    pub fn name(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Whether this is the root namespace
    pub fn is_root(&self) -> bool {
        self.names.is_empty()
    }

    /// The parent namespace. The root is its own parent.
    pub fn parent(&self) -> Self {
        match self.names.split_last() {
            Some((_, rest)) => self.with_names(rest.to_vec(), Vec::new()),
            None => self.clone(),
        }
    }

    /// Append a single literal name, without any spec parsing
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut names = self.names.clone();
        names.push(name.into());
        self.with_names(names, Vec::new())
    }

    /// Resolve a spec relative to this namespace.
    ///
    /// An empty spec resolves to this namespace. Absolute specs ignore this
    /// namespace entirely. Parent directives remove themselves and the name
    /// before them, clamping at the root.
    pub fn resolve(&self, spec: &str) -> Result<Self, NamespaceError> {
        if spec.is_empty() {
            return Ok(self.clone());
        }

        let (name, args) = split_args(spec)?;
        if name.is_empty() {
            return Ok(self.with_names(self.names.clone(), args.unwrap_or_default()));
        }

        let separator = self.syntax.separator.as_str();
        let absolute = name.starts_with(separator);

        let mut path: Vec<&str> = if absolute {
            Vec::new()
        } else {
            self.names.iter().map(String::as_str).collect()
        };
        path.extend(name.split(separator).filter(|n| !n.is_empty()));

        let mut names: Vec<String> = Vec::with_capacity(path.len());
        for segment in path {
            if segment == self.syntax.parent {
                names.pop();
            } else {
                names.push(segment.to_string());
            }
        }

        Ok(self.with_names(names, args.unwrap_or_default()))
    }

    /// Replace `$n` tokens in every name with the n-th value.
    /// Tokens without a matching value are left as they are.
    pub fn format(&self, values: &[String]) -> Self {
        let names = self
            .names
            .iter()
            .map(|name| format_tokens(name, values))
            .collect();
        self.with_names(names, self.args.clone())
    }

    /// Whether both namespaces refer to the same target, optionally also
    /// comparing their arguments
    pub fn equal_to(&self, other: &Namespace, args: bool) -> bool {
        self.to_string_with_args(args) == other.to_string_with_args(args)
    }

    /// The fully qualified namespace string, optionally with arguments
    pub fn to_string_with_args(&self, args: bool) -> String {
        let separator = &self.syntax.separator;
        let mut out = format!("{}{}", separator, self.names.join(separator));
        if args && !self.args.is_empty() {
            out.push('[');
            out.push_str(&self.args.join(","));
            out.push(']');
        }
        out
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_args(false))
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.equal_to(other, true)
    }
}

impl Eq for Namespace {}

impl Hash for Namespace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string_with_args(true).hash(state);
    }
}

/// Substitute `$n` tokens in a template with positional values
pub fn format_tokens(template: &str, values: &[String]) -> String {
    TOKEN_REGEX
        .replace_all(template, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| values.get(i))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Split a spec into its name part and optional trailing argument list
fn split_args(spec: &str) -> Result<(&str, Option<Vec<String>>), NamespaceError> {
    let Some(body) = spec.strip_suffix(']') else {
        if spec.contains(['[', ']']) {
            return Err(NamespaceError::malformed(
                spec,
                "arguments must be a trailing [...] list",
            ));
        }
        return Ok((spec, None));
    };

    let open = body
        .rfind('[')
        .ok_or_else(|| NamespaceError::malformed(spec, "unmatched ']'"))?;
    let (name, list) = (&body[..open], &body[open + 1..]);

    if list.contains(']') || name.contains(['[', ']']) {
        return Err(NamespaceError::malformed(spec, "unbalanced brackets"));
    }

    Ok((name, Some(list.split(',').map(String::from).collect())))
}
