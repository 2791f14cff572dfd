//! Runner: builds the dependency graph for a namespace and executes it

use std::future::Future;
use std::ops::AddAssign;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use take_core::{ActionContext, Namespace};
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::error::TaskError;
use crate::graph::{build_graph, DependencyNode};
use crate::registry::TargetRegistry;
use crate::reporter::{TaskEvent, TaskReporter, TracingReporter};
use crate::target::Invocation;

type NodeFuture = Pin<Box<dyn Future<Output = Result<RunSummary, TaskError>> + Send>>;

/// Counts for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Targets whose gate passed and whose action (if any) ran
    pub executed: usize,
    /// Targets skipped because their outputs were up to date
    pub up_to_date: usize,
}

impl AddAssign for RunSummary {
    fn add_assign(&mut self, other: Self) {
        self.executed += other.executed;
        self.up_to_date += other.up_to_date;
    }
}

/// Executes targets from a registry
pub struct Runner {
    registry: Arc<TargetRegistry>,
    reporter: Arc<dyn TaskReporter>,
}

impl Runner {
    /// Create a runner that reports through tracing
    pub fn new(registry: TargetRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Replace the reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn TaskReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run a namespace and everything it depends on.
    ///
    /// The whole dependency graph is checked for cycles before anything runs.
    #[instrument(skip_all, fields(namespace = %namespace.to_string_with_args(true)))]
    pub async fn execute(&self, namespace: &Namespace) -> Result<RunSummary, TaskError> {
        let start = Instant::now();
        let (node, safe) = build_graph(&self.registry, namespace)?;
        if !safe {
            return Err(TaskError::CyclicDependency(
                namespace.to_string_with_args(true),
            ));
        }

        info!(targets = node.execution_count(), "executing dependency graph");
        self.reporter.report(&TaskEvent::RunStarted {
            namespace: node.name.clone(),
            targets: node.execution_count(),
        });

        let summary = exec_node(node, Arc::clone(&self.reporter)).await?;

        self.reporter.report(&TaskEvent::RunCompleted {
            namespace: namespace.to_string_with_args(true),
            executed: summary.executed,
            up_to_date: summary.up_to_date,
            duration: start.elapsed(),
        });
        Ok(summary)
    }
}

/// Run a node's dependencies and then the node itself
fn exec_node(node: DependencyNode, reporter: Arc<dyn TaskReporter>) -> NodeFuture {
    Box::pin(async move {
        let mut summary = RunSummary::default();
        if !node.execute {
            return Ok(summary);
        }

        let DependencyNode {
            name,
            namespace,
            target,
            matched,
            args,
            children,
            ..
        } = node;

        if target.parallel_deps() {
            summary += join_all(&name, children, &reporter).await?;
        } else {
            for child in children {
                summary += exec_node(child, Arc::clone(&reporter)).await?;
            }
        }

        let start = Instant::now();
        reporter.report(&TaskEvent::Started {
            target: name.clone(),
        });

        let ctx = ActionContext { namespace, matched };
        match target.invoke(&ctx, &args).await {
            Ok(Invocation::Ran) => {
                reporter.report(&TaskEvent::Completed {
                    target: name,
                    duration: start.elapsed(),
                });
                summary.executed += 1;
            }
            Ok(Invocation::UpToDate) => {
                reporter.report(&TaskEvent::UpToDate { target: name });
                summary.up_to_date += 1;
            }
            Err(err) => {
                reporter.report(&TaskEvent::Failed {
                    target: name,
                    duration: start.elapsed(),
                    error: err.to_string(),
                });
                return Err(err);
            }
        }

        Ok(summary)
    })
}

/// Start every child at once and wait for all of them.
///
/// A failure does not cancel the other children. Once all have settled the
/// first failure is returned and later ones are logged.
async fn join_all(
    parent: &str,
    children: Vec<DependencyNode>,
    reporter: &Arc<dyn TaskReporter>,
) -> Result<RunSummary, TaskError> {
    let mut tasks = JoinSet::new();
    for child in children {
        tasks.spawn(exec_node(child, Arc::clone(reporter)));
    }

    let mut summary = RunSummary::default();
    let mut first_error = None;

    while let Some(joined) = tasks.join_next().await {
        let result = joined.unwrap_or_else(|e| {
            Err(TaskError::ActionFailed {
                target: parent.to_string(),
                message: if e.is_panic() {
                    "dependency task panicked".to_string()
                } else {
                    "dependency task was cancelled".to_string()
                },
            })
        });

        match result {
            Ok(child) => summary += child,
            Err(err) if first_error.is_none() => first_error = Some(err),
            Err(err) => warn!(parent, error = %err, "additional dependency failure"),
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use take_core::config::{MatchKind, PathRule};
    use take_core::{action, Action, Environment, TargetSpec, TargetTree};
    use tempfile::TempDir;

    use crate::reporter::CollectingReporter;

    type Log = Arc<Mutex<Vec<(String, Vec<String>)>>>;

    fn recorder(log: &Log, label: &str) -> Arc<dyn Action> {
        let log = log.clone();
        let label = label.to_string();
        action(move |_, args| {
            let log = log.clone();
            let label = label.clone();
            async move {
                log.lock().unwrap().push((label, args));
                Ok(())
            }
        })
    }

    fn spec(log: &Log, label: &str) -> TargetSpec {
        TargetSpec::new().with_execute(recorder(log, label))
    }

    /// Targets `""` and `1`..`21`, each recording its own label when run
    fn sample(log: &Log) -> TargetTree {
        let s = |label: &str| spec(log, label);
        TargetTree::new()
            .with("", s(""))
            .with(
                "1",
                s("1")
                    .with_child("2", s("2"))
                    .with_child("3", s("3"))
                    .with_child(
                        "4",
                        s("4")
                            .with_child("5", s("5").with_dep("^:^"))
                            .with_child(
                                "6",
                                s("6")
                                    .with_dep("7")
                                    .with_child("7", s("7"))
                                    .with_child("8", s("8").with_dep("^:7")),
                            )
                            .with_child("9", s("9").with_dep("^:^:2")),
                    ),
            )
            .with("10", s("10").with_dep(":1"))
            .with("11", s("11").with_dep(":4"))
            .with("12", s("12").with_dep(":3"))
            .with("13", s("13").with_dep("10"))
            .with("14", s("14").with_dep(":3"))
            .with("15", s("15").with_dep(":16"))
            .with("16", s("16").with_dep(":17"))
            .with("17", s("17"))
            .with("18", s("18").with_dep(":1"))
            .with("19", s("19").with_dep(":1").with_dep(":1:2"))
            .with("20", s("20").with_dep(":1").with_dep(":1"))
            .with("21", s("21").with_dep(":1").with_dep(":10"))
    }

    struct Fixture {
        env: Environment,
        runner: Runner,
        log: Log,
    }

    impl Fixture {
        fn new(tree: impl FnOnce(&Log) -> TargetTree) -> Self {
            let env = Environment::default();
            let log: Log = Arc::default();
            let registry = TargetRegistry::build(&tree(&log), &env).unwrap();
            Self {
                env,
                runner: Runner::new(registry),
                log,
            }
        }

        async fn run(&self, spec: &str) -> Result<RunSummary, TaskError> {
            self.runner.execute(&self.env.resolve(spec).unwrap()).await
        }

        fn labels(&self) -> Vec<String> {
            self.log.lock().unwrap().iter().map(|(l, _)| l.clone()).collect()
        }
    }

    #[tokio::test]
    async fn test_root_runs_default_target() {
        let fx = Fixture::new(sample);
        fx.run("").await.unwrap();
        assert_eq!(fx.labels(), vec![""]);
    }

    #[tokio::test]
    async fn test_top_level_target() {
        let fx = Fixture::new(sample);
        fx.run("1").await.unwrap();
        assert_eq!(fx.labels(), vec!["1"]);
    }

    #[tokio::test]
    async fn test_second_level_target() {
        let fx = Fixture::new(sample);
        fx.run(":1:2").await.unwrap();
        assert_eq!(fx.labels(), vec!["2"]);
    }

    #[tokio::test]
    async fn test_single_dependency() {
        for spec in [":10", ":18"] {
            let fx = Fixture::new(sample);
            fx.run(spec).await.unwrap();
            assert_eq!(fx.labels(), vec!["1", &spec[1..]]);
        }
    }

    #[tokio::test]
    async fn test_two_dependencies() {
        let fx = Fixture::new(sample);
        let summary = fx.run(":19").await.unwrap();
        assert_eq!(fx.labels(), vec!["1", "2", "19"]);
        assert_eq!(summary.executed, 3);
    }

    #[tokio::test]
    async fn test_repeated_dependency_runs_once() {
        let fx = Fixture::new(sample);
        fx.run(":20").await.unwrap();
        assert_eq!(fx.labels(), vec!["1", "20"]);
    }

    #[tokio::test]
    async fn test_repeated_transitive_dependency_runs_once() {
        let fx = Fixture::new(sample);
        fx.run(":21").await.unwrap();
        assert_eq!(fx.labels(), vec!["1", "10", "21"]);
    }

    #[tokio::test]
    async fn test_chained_dependencies() {
        let fx = Fixture::new(sample);
        fx.run(":15").await.unwrap();
        assert_eq!(fx.labels(), vec!["17", "16", "15"]);
    }

    #[tokio::test]
    async fn test_relative_dependency_resolves_below_target() {
        let fx = Fixture::new(sample);
        let err = fx.run("13").await.unwrap_err();
        assert!(matches!(err, TaskError::TargetNotFound(ref ns) if ns == ":13:10"));
        assert!(fx.labels().is_empty());
    }

    #[tokio::test]
    async fn test_parent_directive_dependencies() {
        let fx = Fixture::new(sample);
        fx.run("1:4:5").await.unwrap();
        assert_eq!(fx.labels(), vec!["1", "5"]);

        let fx = Fixture::new(sample);
        fx.run("1:4:9").await.unwrap();
        assert_eq!(fx.labels(), vec!["2", "9"]);

        let fx = Fixture::new(sample);
        fx.run("1:4:6:8").await.unwrap();
        assert_eq!(fx.labels(), vec!["7", "8"]);
    }

    #[tokio::test]
    async fn test_relative_child_dependency() {
        let fx = Fixture::new(sample);
        fx.run("1:4:6").await.unwrap();
        assert_eq!(fx.labels(), vec!["7", "6"]);
    }

    #[tokio::test]
    async fn test_missing_dependency_runs_nothing() {
        let fx = Fixture::new(sample);
        let err = fx.run(":11").await.unwrap_err();
        assert!(matches!(err, TaskError::TargetNotFound(ns) if ns == ":4"));
        assert!(fx.labels().is_empty());
    }

    #[tokio::test]
    async fn test_arguments_passed() {
        let fx = Fixture::new(sample);
        fx.run("1[a,b]").await.unwrap();
        assert_eq!(
            fx.log.lock().unwrap().clone(),
            vec![("1".to_string(), vec!["a".to_string(), "b".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_dependency_arguments_passed() {
        let fx = Fixture::new(|log| {
            TargetTree::new()
                .with("lint", spec(log, "lint"))
                .with("check", spec(log, "check").with_dep(":lint[strict]"))
        });
        fx.run("check").await.unwrap();
        assert_eq!(
            fx.log.lock().unwrap().clone(),
            vec![
                ("lint".to_string(), vec!["strict".to_string()]),
                ("check".to_string(), vec![]),
            ]
        );
    }

    #[tokio::test]
    async fn test_cycle_rejected_before_running() {
        let fx = Fixture::new(|log| {
            TargetTree::new()
                .with("ok", spec(log, "ok"))
                .with("a", spec(log, "a").with_dep(":ok").with_dep(":b"))
                .with("b", spec(log, "b").with_dep(":a"))
        });
        let err = fx.run("a").await.unwrap_err();
        assert!(matches!(err, TaskError::CyclicDependency(_)));
        assert!(fx.labels().is_empty());
    }

    #[tokio::test]
    async fn test_failure_stops_sequence() {
        let fx = Fixture::new(|log| {
            TargetTree::new()
                .with(
                    "bad",
                    TargetSpec::new()
                        .with_execute(action(|_, _| async { Err::<(), _>(anyhow::anyhow!("boom")) })),
                )
                .with("after", spec(log, "after"))
                .with("top", spec(log, "top").with_dep(":bad").with_dep(":after"))
        });
        let err = fx.run("top").await.unwrap_err();
        assert!(matches!(err, TaskError::ActionFailed { ref target, .. } if target == ":bad"));
        assert!(fx.labels().is_empty());
    }

    #[tokio::test]
    async fn test_parallel_failure_drains_siblings() {
        let fx = Fixture::new(|log| {
            let slow = log.clone();
            TargetTree::new()
                .with(
                    "bad",
                    TargetSpec::new()
                        .with_execute(action(|_, _| async { Err::<(), _>(anyhow::anyhow!("boom")) })),
                )
                .with(
                    "slow",
                    TargetSpec::new().with_execute(action(move |_, _| {
                        let slow = slow.clone();
                        async move {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            slow.lock().unwrap().push(("slow".to_string(), Vec::new()));
                            Ok(())
                        }
                    })),
                )
                .with(
                    "top",
                    spec(log, "top")
                        .with_parallel_deps(true)
                        .with_dep(":bad")
                        .with_dep(":slow"),
                )
        });

        let err = fx.run("top").await.unwrap_err();
        assert!(matches!(err, TaskError::ActionFailed { .. }));
        // the sibling finished before the error was returned, the parent never ran
        assert_eq!(fx.labels(), vec!["slow"]);
    }

    fn timed(windows: &Arc<Mutex<Vec<(String, Instant, Instant)>>>, label: &str) -> TargetSpec {
        let windows = windows.clone();
        let label = label.to_string();
        TargetSpec::new().with_execute(action(move |_, _| {
            let windows = windows.clone();
            let label = label.clone();
            async move {
                let start = Instant::now();
                tokio::time::sleep(Duration::from_millis(30)).await;
                windows.lock().unwrap().push((label, start, Instant::now()));
                Ok(())
            }
        }))
    }

    async fn run_windows(parallel: bool) -> Vec<(String, Instant, Instant)> {
        let windows = Arc::new(Mutex::new(Vec::new()));
        let tree = TargetTree::new()
            .with("a", timed(&windows, "a"))
            .with("b", timed(&windows, "b"))
            .with("c", timed(&windows, "c"))
            .with(
                "all",
                TargetSpec::new()
                    .with_parallel_deps(parallel)
                    .with_dep(":a")
                    .with_dep(":b")
                    .with_dep(":c"),
            );
        let env = Environment::default();
        let runner = Runner::new(TargetRegistry::build(&tree, &env).unwrap());
        runner.execute(&env.resolve("all").unwrap()).await.unwrap();

        let result = windows.lock().unwrap().clone();
        result
    }

    #[tokio::test]
    async fn test_sequential_windows_disjoint_in_order() {
        let windows = run_windows(false).await;
        let labels: Vec<&str> = windows.iter().map(|(l, _, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        for pair in windows.windows(2) {
            assert!(pair[0].2 <= pair[1].1);
        }
    }

    #[tokio::test]
    async fn test_parallel_windows_overlap() {
        let windows = run_windows(true).await;
        assert_eq!(windows.len(), 3);
        let latest_start = windows.iter().map(|(_, s, _)| *s).max().unwrap();
        let earliest_end = windows.iter().map(|(_, _, e)| *e).min().unwrap();
        assert!(latest_start < earliest_end);
    }

    #[tokio::test]
    async fn test_parent_runs_after_parallel_children() {
        let fx = Fixture::new(|log| {
            TargetTree::new()
                .with("a", spec(log, "a"))
                .with("b", spec(log, "b"))
                .with(
                    "top",
                    spec(log, "top")
                        .with_parallel_deps(true)
                        .with_dep(":a")
                        .with_dep(":b"),
                )
        });
        fx.run("top").await.unwrap();
        let labels = fx.labels();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[2], "top");
    }

    #[tokio::test]
    async fn test_regex_target_with_formatted_dependency() {
        let fx = Fixture::new(|log| {
            TargetTree::new()
                .with("compile-core", spec(log, "compile-core"))
                .with(
                    "/^test-(.*)$/",
                    spec(log, "test")
                        .with_match(MatchKind::Regex)
                        .with_dep(":compile-$1"),
                )
        });
        fx.run("test-core").await.unwrap();
        assert_eq!(fx.labels(), vec!["compile-core", "test"]);
    }

    #[tokio::test]
    async fn test_glob_target() {
        let fx = Fixture::new(|log| {
            TargetTree::new().with("lint-*", spec(log, "lint").with_match(MatchKind::Glob))
        });
        fx.run("lint-docs").await.unwrap();
        assert_eq!(fx.labels(), vec!["lint"]);
    }

    #[tokio::test]
    async fn test_up_to_date_target_counts_as_done() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.txt");
        std::fs::write(&output, "built").unwrap();
        let path = output.to_string_lossy().into_owned();

        let fx = Fixture::new(|log| {
            TargetTree::new()
                .with("gen", spec(log, "gen").with_outputs(PathRule::One(path)))
                .with("use", spec(log, "use").with_dep(":gen"))
        });
        let summary = fx.run("use").await.unwrap();
        assert_eq!(fx.labels(), vec!["use"]);
        assert_eq!(
            summary,
            RunSummary {
                executed: 1,
                up_to_date: 1
            }
        );
    }

    #[tokio::test]
    async fn test_missing_input_aborts_dependents() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.txt").to_string_lossy().into_owned();

        let fx = Fixture::new(|log| {
            TargetTree::new()
                .with("gen", spec(log, "gen").with_inputs(PathRule::One(missing)))
                .with("use", spec(log, "use").with_dep(":gen"))
        });
        let err = fx.run("use").await.unwrap_err();
        assert!(matches!(err, TaskError::MissingInputFile { .. }));
        assert!(fx.labels().is_empty());
    }

    #[tokio::test]
    async fn test_reporter_events() {
        let log: Log = Arc::default();
        let env = Environment::default();
        let tree = TargetTree::new()
            .with("a", spec(&log, "a"))
            .with("b", spec(&log, "b").with_dep(":a"));
        let reporter = Arc::new(CollectingReporter::default());
        let runner = Runner::new(TargetRegistry::build(&tree, &env).unwrap())
            .with_reporter(reporter.clone());

        runner.execute(&env.resolve("b").unwrap()).await.unwrap();

        let events = reporter.events();
        assert!(matches!(
            &events[0],
            TaskEvent::RunStarted { namespace, targets: 2 } if namespace == ":b"
        ));
        let started: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                TaskEvent::Started { target } => Some(target.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec![":a", ":b"]);
        assert!(matches!(
            events.last(),
            Some(TaskEvent::RunCompleted { executed: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_each_execute_builds_fresh_graph() {
        let fx = Fixture::new(sample);
        fx.run(":10").await.unwrap();
        fx.run(":10").await.unwrap();
        assert_eq!(fx.labels(), vec!["1", "10", "1", "10"]);
    }
}
