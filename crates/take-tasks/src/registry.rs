//! Target registry: the built tree of targets and name matching
//!
//! Each level of the tree keeps three pools. A name is looked up in the exact
//! pool first, then in the regex pool and finally in the glob pool, both in
//! declaration order. The first hit wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::{Regex, RegexBuilder};
use take_core::config::MatchKind;
use take_core::{Environment, Namespace, TargetTree};
use tracing::{debug, instrument};

use crate::error::TaskError;
use crate::target::Target;

/// `/pattern/flags` regex literal
static REGEX_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^/(.*)/(.*)$").expect("Invalid regex"));

/// Matches target names against glob patterns
pub trait GlobMatcher: Send + Sync + fmt::Debug {
    /// Whether `name` matches `pattern`
    fn is_match(&self, pattern: &str, name: &str) -> bool;
}

/// Shell-style glob matching. Invalid patterns never match.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternMatcher;

impl GlobMatcher for PatternMatcher {
    fn is_match(&self, pattern: &str, name: &str) -> bool {
        glob::Pattern::new(pattern)
            .map(|p| p.matches(name))
            .unwrap_or(false)
    }
}

#[derive(Debug)]
struct RegexRule {
    regex: Regex,
    target: Arc<Target>,
}

#[derive(Debug)]
struct GlobRule {
    pattern: String,
    target: Arc<Target>,
}

/// A target found for a namespace, with the data its name was matched with
#[derive(Debug, Clone)]
pub struct Resolved {
    pub target: Arc<Target>,
    /// Index 0 is the whole match; regex targets add one entry per group
    pub matched: Vec<String>,
}

/// One level of built targets
#[derive(Debug)]
pub struct TargetRegistry {
    exact: HashMap<String, Arc<Target>>,
    /// Exact names in declaration order
    order: Vec<String>,
    regex: Vec<RegexRule>,
    glob: Vec<GlobRule>,
    matcher: Arc<dyn GlobMatcher>,
}

impl TargetRegistry {
    /// Build the registry for a whole target tree using shell-style globs
    pub fn build(tree: &TargetTree, env: &Environment) -> Result<Self, TaskError> {
        Self::build_with_matcher(tree, env, Arc::new(PatternMatcher))
    }

    /// Build the registry with a custom glob matcher
    #[instrument(skip_all, fields(targets = tree.len()))]
    pub fn build_with_matcher(
        tree: &TargetTree,
        env: &Environment,
        matcher: Arc<dyn GlobMatcher>,
    ) -> Result<Self, TaskError> {
        let registry = Self::build_at(tree, env, env.root(), matcher)?;
        debug!(
            exact = registry.exact.len(),
            regex = registry.regex.len(),
            glob = registry.glob.len(),
            "target registry built"
        );
        Ok(registry)
    }

    /// Build the level of targets declared under `path`
    pub(crate) fn build_at(
        tree: &TargetTree,
        env: &Environment,
        path: &Namespace,
        matcher: Arc<dyn GlobMatcher>,
    ) -> Result<Self, TaskError> {
        let mut registry = Self {
            exact: HashMap::new(),
            order: Vec::new(),
            regex: Vec::new(),
            glob: Vec::new(),
            matcher,
        };

        for (name, spec) in tree.iter() {
            let target = Arc::new(Target::new(name, spec, env, path, &registry.matcher)?);
            match spec.match_kind {
                MatchKind::Exact => {
                    registry.order.push(name.to_string());
                    registry.exact.insert(name.to_string(), target);
                }
                MatchKind::Regex => registry.regex.push(RegexRule {
                    regex: parse_regex_literal(name)?,
                    target,
                }),
                MatchKind::Glob => registry.glob.push(GlobRule {
                    pattern: name.to_string(),
                    target,
                }),
            }
        }

        Ok(registry)
    }

    /// Number of targets at this level
    pub fn len(&self) -> usize {
        self.exact.len() + self.regex.len() + self.glob.len()
    }

    /// Whether this level has no targets
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Targets at this level: exact, then regex, then glob, each in
    /// declaration order
    pub fn targets(&self) -> impl Iterator<Item = &Arc<Target>> {
        self.order
            .iter()
            .filter_map(|name| self.exact.get(name))
            .chain(self.regex.iter().map(|rule| &rule.target))
            .chain(self.glob.iter().map(|rule| &rule.target))
    }

    /// Match a single name at this level
    fn match_name(&self, name: &str) -> Option<(&Arc<Target>, Vec<String>)> {
        if let Some(target) = self.exact.get(name) {
            return Some((target, vec![name.to_string()]));
        }

        for rule in &self.regex {
            if let Some(caps) = rule.regex.captures(name) {
                let matched = caps
                    .iter()
                    .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect();
                return Some((&rule.target, matched));
            }
        }

        self.glob
            .iter()
            .find(|rule| self.matcher.is_match(&rule.pattern, name))
            .map(|rule| (&rule.target, vec![name.to_string()]))
    }

    /// Find the target for a namespace.
    ///
    /// The root namespace maps to the default target, declared with an empty
    /// name. The match data returned is that of the last name.
    pub fn find(&self, namespace: &Namespace) -> Result<Resolved, TaskError> {
        let not_found = || TaskError::TargetNotFound(namespace.to_string());

        if namespace.is_root() {
            let target = self.exact.get("").ok_or_else(not_found)?;
            return Ok(Resolved {
                target: Arc::clone(target),
                matched: vec![String::new()],
            });
        }

        let mut level = self;
        let mut found = None;
        for name in namespace.names() {
            let (target, matched) = level.match_name(name).ok_or_else(not_found)?;
            level = target.children();
            found = Some((target, matched));
        }

        let (target, matched) = found.ok_or_else(not_found)?;
        Ok(Resolved {
            target: Arc::clone(target),
            matched,
        })
    }
}

/// Compile a `/pattern/flags` literal
fn parse_regex_literal(literal: &str) -> Result<Regex, TaskError> {
    let invalid = |reason: String| TaskError::InvalidRegexLiteral {
        literal: literal.to_string(),
        reason,
    };

    let caps = REGEX_LITERAL
        .captures(literal)
        .ok_or_else(|| invalid("expected /pattern/flags".to_string()))?;

    let mut builder = RegexBuilder::new(&caps[1]);
    for flag in caps[2].chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'u' => builder.unicode(true),
            'g' | 'y' => &mut builder,
            other => return Err(invalid(format!("unsupported flag '{other}'"))),
        };
    }

    builder.build().map_err(|e| invalid(e.to_string()))
}
