//! Task graph: one `transform → upload` chain per source.
//!
//! ```text
//! transform_dawn ──▶ upload_dawn
//! transform_bbc  ──▶ upload_bbc
//! ```
//!
//! Chains share no edge and no state. They run concurrently; within a chain
//! the steps run strictly in order and a step only starts once its upstream
//! has succeeded. Each task moves `pending → running → succeeded | failed`
//! and gets the configured number of retries before it is marked failed.
//! A task whose upstream failed stays `pending`.

use crate::error::PipelineError;
use crate::jobs::{transform, upload};
use crate::models::Source;
use crate::retry::{Attempted, RetryPolicy};
use crate::scrapers::Fetcher;
use crate::storage::{CredentialProvider, RemoteStore};
use crate::utils::{artifact_path, truncate_for_log};
use chrono::{DateTime, Local};
use futures::future::join_all;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Transform,
    Upload,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskKind::Transform => "transform",
            TaskKind::Upload => "upload",
        })
    }
}

/// Task identifier, rendered as `<kind>_<source>` (e.g. `upload_bbc`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId {
    pub kind: TaskKind,
    pub source: String,
}

impl TaskId {
    pub fn new(kind: TaskKind, source: &str) -> Self {
        Self {
            kind,
            source: source.to_string(),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.source)
    }
}

impl FromStr for TaskId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || PipelineError::Config(format!("unknown task {s:?}"));
        let (kind, source) = s.split_once('_').ok_or_else(unknown)?;
        let kind = match kind {
            "transform" => TaskKind::Transform,
            "upload" => TaskKind::Upload,
            _ => return Err(unknown()),
        };
        if source.is_empty() {
            return Err(unknown());
        }
        Ok(TaskId::new(kind, source))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    /// Task that must succeed before this one runs.
    pub upstream: Option<TaskId>,
}

/// Tasks for one source, in execution order.
#[derive(Debug, Clone)]
pub struct Chain {
    pub source: Source,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone)]
pub struct TaskGraph {
    chains: Vec<Chain>,
}

impl TaskGraph {
    /// Declare a `transform → upload` chain for every source.
    pub fn new(sources: &[Source]) -> Self {
        let chains = sources
            .iter()
            .map(|source| {
                let transform = TaskId::new(TaskKind::Transform, &source.name);
                let upload = TaskId::new(TaskKind::Upload, &source.name);
                Chain {
                    source: source.clone(),
                    tasks: vec![
                        Task {
                            id: transform.clone(),
                            upstream: None,
                        },
                        Task {
                            id: upload,
                            upstream: Some(transform),
                        },
                    ],
                }
            })
            .collect();
        Self { chains }
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.chains.iter().flat_map(|c| c.tasks.iter())
    }

    /// `(upstream, downstream)` pairs.
    pub fn edges(&self) -> Vec<(&TaskId, &TaskId)> {
        self.tasks()
            .filter_map(|t| t.upstream.as_ref().map(|up| (up, &t.id)))
            .collect()
    }

    /// Look up a task by its rendered id.
    pub fn find(&self, id: &str) -> Result<(&Task, &Source), PipelineError> {
        let wanted: TaskId = id.parse()?;
        self.chains
            .iter()
            .find_map(|chain| {
                chain
                    .tasks
                    .iter()
                    .find(|t| t.id == wanted)
                    .map(|t| (t, &chain.source))
            })
            .ok_or_else(|| PipelineError::Config(format!("unknown task {id:?}")))
    }
}

impl fmt::Display for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chain in &self.chains {
            let source = &chain.source;
            writeln!(f, "{}: {} => {}", source.name, source.url, source.artifact)?;
        }
        for (upstream, downstream) in self.edges() {
            writeln!(f, "  {upstream} -> {downstream}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct TaskStatus {
    pub id: TaskId,
    pub state: TaskState,
    pub attempts: usize,
    pub failure: Option<TaskFailure>,
    pub elapsed: Duration,
}

impl TaskStatus {
    pub fn pending(id: TaskId) -> Self {
        Self {
            id,
            state: TaskState::Pending,
            attempts: 0,
            failure: None,
            elapsed: Duration::ZERO,
        }
    }

    fn start(&mut self) {
        debug_assert_eq!(self.state, TaskState::Pending);
        self.state = TaskState::Running;
    }

    fn finish(&mut self, outcome: Attempted<(), PipelineError>, elapsed: Duration) {
        debug_assert_eq!(self.state, TaskState::Running);
        self.attempts = outcome.attempts;
        self.elapsed = elapsed;
        match outcome.result {
            Ok(()) => self.state = TaskState::Succeeded,
            Err(e) => {
                self.state = TaskState::Failed;
                self.failure = Some(TaskFailure {
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Per-task outcome of one graph run.
#[derive(Debug, Clone)]
pub struct GraphReport {
    pub started_at: DateTime<Local>,
    pub statuses: Vec<TaskStatus>,
}

impl GraphReport {
    pub fn is_success(&self) -> bool {
        self.statuses.iter().all(|s| s.state == TaskState::Succeeded)
    }

    pub fn status(&self, id: &str) -> Option<&TaskStatus> {
        self.statuses.iter().find(|s| s.id.to_string() == id)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskStatus> {
        self.statuses.iter().filter(|s| s.state == TaskState::Failed)
    }
}

impl fmt::Display for GraphReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run started {}", self.started_at.to_rfc3339())?;
        for s in &self.statuses {
            write!(f, "  {:<20} {:<10}", s.id.to_string(), s.state.to_string())?;
            match (&s.state, &s.failure) {
                (TaskState::Failed, Some(failure)) => writeln!(
                    f,
                    " source={} attempts={} error={}: {}",
                    s.id.source,
                    s.attempts,
                    failure.kind,
                    truncate_for_log(&failure.message, 200)
                )?,
                (TaskState::Pending, _) => writeln!(f, " not run (upstream did not succeed)")?,
                _ => writeln!(f, " attempts={} elapsed_ms={}", s.attempts, s.elapsed.as_millis())?,
            }
        }
        Ok(())
    }
}

/// Everything a task needs to run: the collaborators and the shared settings.
#[derive(Debug)]
pub struct Pipeline<F, C, S> {
    pub fetcher: F,
    pub credentials: C,
    pub store: S,
    pub output_dir: PathBuf,
    pub folder_id: String,
    pub retry: RetryPolicy,
}

impl<F, C, S> Pipeline<F, C, S>
where
    F: Fetcher,
    C: CredentialProvider,
    S: RemoteStore,
{
    async fn execute(&self, task: &TaskId, source: &Source) -> Result<(), PipelineError> {
        let artifact = artifact_path(&self.output_dir, &source.artifact);
        match task.kind {
            TaskKind::Transform => {
                transform(&self.fetcher, &source.url, &artifact).await?;
            }
            TaskKind::Upload => {
                upload(&self.credentials, &self.store, &artifact, &self.folder_id).await?;
            }
        }
        Ok(())
    }

    /// Run one task with retries, ignoring its upstream.
    #[instrument(level = "info", skip_all, fields(task = %task, source = %source.name))]
    pub async fn run_task(&self, task: &TaskId, source: &Source) -> TaskStatus {
        let mut status = TaskStatus::pending(task.clone());
        status.start();
        info!("Task running");

        let t0 = Instant::now();
        let label = task.to_string();
        let outcome = self.retry.run(&label, || self.execute(task, source)).await;
        status.finish(outcome, t0.elapsed());

        match &status.failure {
            None => info!(attempts = status.attempts, "Task succeeded"),
            Some(failure) => error!(
                attempts = status.attempts,
                kind = failure.kind,
                error = %failure.message,
                "Task failed"
            ),
        }
        status
    }

    /// Run a chain in order. Tasks whose upstream did not succeed are left
    /// pending.
    pub async fn run_chain(&self, chain: &Chain) -> Vec<TaskStatus> {
        let mut statuses: Vec<TaskStatus> = Vec::with_capacity(chain.tasks.len());
        for task in &chain.tasks {
            let ready = match &task.upstream {
                None => true,
                Some(up) => statuses
                    .iter()
                    .any(|s| &s.id == up && s.state == TaskState::Succeeded),
            };
            if ready {
                statuses.push(self.run_task(&task.id, &chain.source).await);
            } else {
                statuses.push(TaskStatus::pending(task.id.clone()));
            }
        }
        statuses
    }

    /// Run every chain concurrently and collect the per-task report.
    #[instrument(level = "info", skip_all, fields(chains = graph.chains().len()))]
    pub async fn run_graph(&self, graph: &TaskGraph) -> GraphReport {
        let started_at = Local::now();
        let t0 = Instant::now();
        let per_chain = join_all(graph.chains().iter().map(|c| self.run_chain(c))).await;
        let report = GraphReport {
            started_at,
            statuses: per_chain.into_iter().flatten().collect(),
        };
        info!(
            succeeded = report.statuses.iter().filter(|s| s.state == TaskState::Succeeded).count(),
            failed = report.failures().count(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Graph run complete"
        );
        report
    }

    /// Run the single task named `id` (e.g. `upload_dawn`).
    pub async fn run_step(&self, graph: &TaskGraph, id: &str) -> Result<TaskStatus, PipelineError> {
        let (task, source) = graph.find(id)?;
        Ok(self.run_task(&task.id, source).await)
    }

    /// Run the graph every `period`, starting immediately. Ticks missed while
    /// a run is in progress are skipped, not caught up. Stops after
    /// `max_runs` runs when given.
    pub async fn run_on_schedule(
        &self,
        graph: &TaskGraph,
        period: Duration,
        max_runs: Option<usize>,
    ) -> Vec<GraphReport> {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut reports = Vec::new();

        loop {
            ticker.tick().await;
            let report = self.run_graph(graph).await;
            println!("{report}");
            reports.push(report);

            if max_runs.is_some_and(|max| reports.len() >= max) {
                return reports;
            }
            let next = chrono::Duration::from_std(period)
                .ok()
                .and_then(|d| Local::now().checked_add_signed(d));
            if let Some(next) = next {
                info!(next_run = %next.to_rfc3339(), "Waiting for next scheduled run");
            }
        }
    }
}
