//! Target execution reporting

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Events emitted while running targets
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A run for a requested namespace is starting
    RunStarted { namespace: String, targets: usize },
    /// A target's gate and action are starting
    Started { target: String },
    /// A target finished
    Completed { target: String, duration: Duration },
    /// A target's outputs were up to date so its action was skipped
    UpToDate { target: String },
    /// A target failed
    Failed {
        target: String,
        duration: Duration,
        error: String,
    },
    /// The run for a requested namespace finished
    RunCompleted {
        namespace: String,
        executed: usize,
        up_to_date: usize,
        duration: Duration,
    },
}

/// Trait for reporting execution progress
pub trait TaskReporter: Send + Sync {
    /// Handle an event
    fn report(&self, event: &TaskEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl TaskReporter for TracingReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::RunStarted { namespace, targets } => {
                tracing::info!("Running {} ({} targets)", namespace, targets);
            }
            TaskEvent::Started { target } => {
                tracing::debug!("Starting {}", target);
            }
            TaskEvent::Completed { target, duration } => {
                tracing::info!("{} completed in {:.1}s", target, duration.as_secs_f64());
            }
            TaskEvent::UpToDate { target } => {
                tracing::info!("{} is up to date", target);
            }
            TaskEvent::Failed {
                target,
                duration,
                error,
            } => {
                tracing::error!(
                    "{} failed after {:.1}s: {}",
                    target,
                    duration.as_secs_f64(),
                    error
                );
            }
            TaskEvent::RunCompleted {
                namespace,
                executed,
                up_to_date,
                duration,
            } => {
                tracing::info!(
                    "{} done: {} ran, {} up to date ({:.1}s)",
                    namespace,
                    executed,
                    up_to_date,
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Reporter that collects events for later inspection
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<TaskEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TaskReporter for CollectingReporter {
    fn report(&self, event: &TaskEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

/// Broadcasts events to several reporters
pub struct TaskReporterRegistry {
    reporters: Vec<Arc<dyn TaskReporter>>,
}

impl TaskReporterRegistry {
    /// A registry with a [`TracingReporter`]
    pub fn new() -> Self {
        Self {
            reporters: vec![Arc::new(TracingReporter)],
        }
    }

    pub fn register(&mut self, reporter: Arc<dyn TaskReporter>) {
        self.reporters.push(reporter);
    }
}

impl TaskReporter for TaskReporterRegistry {
    fn report(&self, event: &TaskEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}

impl Default for TaskReporterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
