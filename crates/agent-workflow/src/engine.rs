//! Level-by-level execution engine
//!
//! Levels run strictly one after another. Within a level every runnable task
//! is spawned onto a [`JoinSet`] sized to the level, and the set is drained
//! before the next level starts. Workers only return values: the
//! orchestrating task is the single writer of the execution records and of
//! the context, so no locks are needed around either.

use crate::descriptor::{TaskDescriptor, TaskRegistry};
use crate::error::WorkflowError;
use crate::execution::{ExecutionMap, TaskExecution, TaskStatus};
use crate::graph::{DependencyGraph, Edge};
use crate::prompt::PromptRenderer;
use agent_core::{AgentProvider, ExecutionContext, ProviderError, TaskOutput};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Per-run options
#[derive(Debug, Default)]
pub struct RunOptions {
    /// Overall budget, checked before each level starts
    pub timeout: Option<Duration>,
    /// Receives a snapshot of every execution record as the run progresses
    pub progress: Option<watch::Sender<ExecutionMap>>,
}

impl RunOptions {
    /// Set the time budget
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the progress channel
    pub fn with_progress(mut self, progress: watch::Sender<ExecutionMap>) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Execution records in declaration order
    pub executions: ExecutionMap,
    /// Final context, including every completed role's result
    pub context: ExecutionContext,
    /// Levels the run was scheduled with
    pub levels: Vec<Vec<String>>,
    /// Dependency edges
    pub edges: Vec<Edge>,
    /// Roles flagged as required
    pub required_roles: Vec<String>,
    /// Number of provider calls made
    pub agent_invocations: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
    /// Whether the time budget stopped the run early
    pub timed_out: bool,
    /// Run-level error text (currently only the timeout)
    pub error: Option<String>,
}

impl RunReport {
    /// Status of a role
    pub fn status(&self, role: &str) -> Option<TaskStatus> {
        self.executions.status(role)
    }

    /// Required roles that did not complete
    pub fn incomplete_required(&self) -> Vec<&str> {
        self.required_roles
            .iter()
            .filter(|role| self.status(role) != Some(TaskStatus::Completed))
            .map(String::as_str)
            .collect()
    }

    /// The run finished in time and every required role completed
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.incomplete_required().is_empty()
    }
}

/// What a worker hands back to the orchestrator
struct WorkerResult {
    role: String,
    outcome: Result<TaskOutput, ProviderError>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    invoked: bool,
}

/// Runs a workflow's levels against an agent provider
pub struct ExecutionEngine<'a> {
    registry: &'a TaskRegistry,
    graph: &'a DependencyGraph,
    renderer: Arc<PromptRenderer>,
}

impl<'a> ExecutionEngine<'a> {
    /// Create an engine over a registry and its dependency graph
    pub fn new(
        registry: &'a TaskRegistry,
        graph: &'a DependencyGraph,
        renderer: Arc<PromptRenderer>,
    ) -> Self {
        Self {
            registry,
            graph,
            renderer,
        }
    }

    /// Execute the levels in order
    ///
    /// Task failures never abort the run; they are recorded and prune the
    /// failed task's dependents. Only the time budget stops the run early,
    /// leaving the remaining tasks pending.
    pub async fn run(
        &self,
        levels: &[Vec<String>],
        provider: Arc<dyn AgentProvider>,
        mut context: ExecutionContext,
        options: RunOptions,
    ) -> RunReport {
        let started = Instant::now();
        let mut executions = ExecutionMap::pending(self.registry.roles());
        let mut agent_invocations = 0;
        let mut timed_out = false;
        let mut run_error = None;

        info!(
            "Running {} roles in {} levels",
            self.registry.len(),
            levels.len()
        );
        publish(&options, &executions);

        for (index, level) in levels.iter().enumerate() {
            if let Some(budget) = options.timeout {
                let elapsed = started.elapsed();
                if elapsed >= budget {
                    let err = WorkflowError::Timeout { elapsed, budget };
                    warn!("{}; {} levels not started", err, levels.len() - index);
                    timed_out = true;
                    run_error = Some(err.to_string());
                    break;
                }
            }

            info!("Level {}/{}: {:?}", index + 1, levels.len(), level);

            let snapshot = Arc::new(context.clone());
            let mut join_set = JoinSet::new();

            for role in level {
                let Some(descriptor) = self.registry.get(role) else {
                    continue;
                };

                if let Some(reason) = self.skip_reason(role, &executions) {
                    debug!("Skipping '{}': {}", role, reason);
                    update(&mut executions, role, |exec| exec.skip(reason));
                    continue;
                }

                update(&mut executions, role, |exec| exec.start(Utc::now()));
                debug!("Submitting '{}'", role);

                let descriptor = Arc::new(descriptor.clone());
                let provider = Arc::clone(&provider);
                let renderer = Arc::clone(&self.renderer);
                let snapshot = Arc::clone(&snapshot);

                join_set.spawn(async move {
                    execute_task(descriptor, provider, renderer, snapshot).await
                });
            }

            publish(&options, &executions);

            // Barrier: the whole level settles before its results are merged
            let mut results = Vec::with_capacity(join_set.len());
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(result) => results.push(result),
                    Err(e) => error!("Worker in level {} did not finish: {}", index + 1, e),
                }
            }

            for result in results {
                if result.invoked {
                    agent_invocations += 1;
                }
                match result.outcome {
                    Ok(output) => {
                        debug!("'{}' completed", result.role);
                        context.insert(result.role.clone(), output.to_context_value());
                        update(&mut executions, &result.role, |exec| {
                            exec.start_time = Some(result.started_at);
                            exec.complete(output, result.finished_at)
                        });
                    }
                    Err(e) => {
                        warn!("'{}' failed: {}", result.role, e);
                        update(&mut executions, &result.role, |exec| {
                            exec.start_time = Some(result.started_at);
                            exec.fail(e.to_string(), result.finished_at)
                        });
                    }
                }
            }

            // Anything still running lost its worker (panic or abort)
            for role in level {
                if executions.status(role) == Some(TaskStatus::Running) {
                    update(&mut executions, role, |exec| {
                        exec.fail("task panicked before returning a result", Utc::now())
                    });
                }
            }

            publish(&options, &executions);
        }

        let elapsed = started.elapsed();
        info!(
            "Run finished in {:.2}s: {} completed, {} failed, {} skipped, {} pending",
            elapsed.as_secs_f64(),
            executions.count(TaskStatus::Completed),
            executions.count(TaskStatus::Failed),
            executions.count(TaskStatus::Skipped),
            executions.count(TaskStatus::Pending),
        );

        RunReport {
            executions,
            context,
            levels: levels.to_vec(),
            edges: self.graph.edges(),
            required_roles: self
                .registry
                .iter()
                .filter(|d| d.required)
                .map(|d| d.role.clone())
                .collect(),
            agent_invocations,
            elapsed,
            timed_out,
            error: run_error,
        }
    }

    /// A role is skipped when any of its dependencies failed or was skipped
    fn skip_reason(&self, role: &str, executions: &ExecutionMap) -> Option<String> {
        self.graph
            .dependencies_of(role)
            .iter()
            .find_map(|dep| match executions.status(dep) {
                Some(TaskStatus::Failed) => Some(format!("dependency '{dep}' failed")),
                Some(TaskStatus::Skipped) => Some(format!("dependency '{dep}' was skipped")),
                _ => None,
            })
    }
}

async fn execute_task(
    descriptor: Arc<TaskDescriptor>,
    provider: Arc<dyn AgentProvider>,
    renderer: Arc<PromptRenderer>,
    context: Arc<ExecutionContext>,
) -> WorkerResult {
    let role = descriptor.role.clone();

    let prompt = match renderer.render(&descriptor.prompt_template, &context) {
        Ok(prompt) => prompt,
        Err(e) => {
            let now = Utc::now();
            return WorkerResult {
                role,
                outcome: Err(e),
                started_at: now,
                finished_at: now,
                invoked: false,
            };
        }
    };

    let started_at = Utc::now();
    let outcome = provider.run_task(descriptor.request(prompt)).await;

    WorkerResult {
        role,
        outcome,
        started_at,
        finished_at: Utc::now(),
        invoked: true,
    }
}

fn publish(options: &RunOptions, executions: &ExecutionMap) {
    if let Some(progress) = &options.progress {
        progress.send_replace(executions.clone());
    }
}

/// Apply a transition, logging instead of propagating an illegal one
fn update<F>(executions: &mut ExecutionMap, role: &str, apply: F)
where
    F: FnOnce(&mut TaskExecution) -> crate::error::Result<()>,
{
    let Some(exec) = executions.get_mut(role) else {
        return;
    };
    if let Err(e) = apply(exec) {
        error!("{}", e);
    }
}
