//! The local host: runs a [`BuildPlan`] on a tokio runtime.
//!
//! Ready steps start as soon as their upstream steps finish, at most `jobs`
//! at a time. A failed step blocks everything downstream of it while
//! unrelated steps keep running.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, PoisonError};

use folio_cache::{CacheError, StepCache};
use folio_diagnostics::DiagnosticSink;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::plan::{BuildPlan, Step};
use crate::steps::{run_step, HostContext, StepStatus};

/// What happened to every step of a run.
#[derive(Debug, Default)]
pub struct HostReport {
    /// Steps that did their work.
    pub ran: Vec<String>,
    /// Steps skipped as cache hits.
    pub up_to_date: Vec<String>,
    /// Failed steps with their error.
    pub failed: Vec<(String, String)>,
    /// Steps never started because of a failure or cancellation.
    pub skipped: Vec<String>,
    /// Whether the run was cancelled.
    pub cancelled: bool,
}

impl HostReport {
    /// Returns `true` if every step ran or was up to date.
    pub fn success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && !self.cancelled
    }
}

enum Outcome {
    Done(StepStatus),
    Failed(String),
    Skipped,
}

/// Executes the step graph of one plan.
pub struct Host {
    ctx: Arc<HostContext>,
    graph: DiGraph<Step, ()>,
    order: Vec<NodeIndex>,
}

impl Host {
    /// A host for `plan`; `cancel` turning `true` stops the run.
    pub fn new(plan: BuildPlan, cache: StepCache, cancel: watch::Receiver<bool>) -> Self {
        let ctx = HostContext::new(plan.units, plan.registry, cache, cancel);
        Self {
            ctx: Arc::new(ctx),
            graph: plan.graph,
            order: plan.order,
        }
    }

    /// Diagnostics collected by the steps.
    pub fn sink(&self) -> &DiagnosticSink {
        &self.ctx.sink
    }

    /// Writes the step cache back to disk.
    pub fn save_cache(&self) -> Result<(), CacheError> {
        self.ctx
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .save()
    }

    /// Runs every step with at most `jobs` in flight.
    pub async fn run(&self, jobs: usize) -> HostReport {
        let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
        let mut pending: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|n| (n, self.graph.neighbors_directed(n, Direction::Incoming).count()))
            .collect();
        let mut ready: VecDeque<NodeIndex> = self
            .order
            .iter()
            .copied()
            .filter(|n| pending.get(n) == Some(&0))
            .collect();
        let mut blocked: HashSet<NodeIndex> = HashSet::new();
        let mut report = HostReport::default();
        let mut running = JoinSet::new();

        loop {
            while let Some(node) = ready.pop_front() {
                let step = self.graph[node].clone();
                if blocked.contains(&node) {
                    warn!(step = %step, "skipping: an upstream step failed");
                    report.skipped.push(step.id());
                    self.release(node, &mut pending, &mut ready);
                    continue;
                }
                let ctx = self.ctx.clone();
                let semaphore = semaphore.clone();
                running.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return (node, Outcome::Skipped);
                    };
                    if *ctx.cancel.borrow() {
                        return (node, Outcome::Skipped);
                    }
                    info!(step = %step, "running");
                    // A separate task turns a panicking step into a failure.
                    let outcome = match tokio::spawn(run_step(ctx, step)).await {
                        Ok(Ok(status)) => Outcome::Done(status),
                        Ok(Err(e)) => Outcome::Failed(e.to_string()),
                        Err(e) => Outcome::Failed(format!("step panicked: {e}")),
                    };
                    (node, outcome)
                });
            }

            let Some(joined) = running.join_next().await else {
                break;
            };
            let (node, outcome) = match joined {
                Ok(finished) => finished,
                Err(e) => {
                    error!(error = %e, "host task failed");
                    continue;
                }
            };
            let id = self.graph[node].id();
            match outcome {
                Outcome::Done(StepStatus::Ran) => report.ran.push(id),
                Outcome::Done(StepStatus::UpToDate) => report.up_to_date.push(id),
                Outcome::Skipped => report.skipped.push(id),
                Outcome::Failed(message) => {
                    error!(step = %id, error = %message, "step failed");
                    report.failed.push((id, message));
                    self.block_downstream(node, &mut blocked);
                }
            }
            self.release(node, &mut pending, &mut ready);
        }

        // Steps stranded behind a lost host task.
        let finished: HashSet<String> = report
            .ran
            .iter()
            .chain(&report.up_to_date)
            .chain(&report.skipped)
            .chain(report.failed.iter().map(|(id, _)| id))
            .cloned()
            .collect();
        for &node in &self.order {
            let id = self.graph[node].id();
            if !finished.contains(&id) {
                report.skipped.push(id);
            }
        }
        report.cancelled = *self.ctx.cancel.borrow();
        report
    }

    fn release(
        &self,
        node: NodeIndex,
        pending: &mut HashMap<NodeIndex, usize>,
        ready: &mut VecDeque<NodeIndex>,
    ) {
        for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if let Some(count) = pending.get_mut(&next) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.push_back(next);
                }
            }
        }
    }

    fn block_downstream(&self, node: NodeIndex, blocked: &mut HashSet<NodeIndex>) {
        let mut dfs = Dfs::new(&self.graph, node);
        while let Some(next) = dfs.next(&self.graph) {
            if next != node {
                blocked.insert(next);
            }
        }
    }
}
