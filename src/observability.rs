//! Lightweight observability helpers — a latency tracker for phase/task
//! timings and a point-in-time health summary of a `ProjectState`, in the
//! same spirit as a daemon's `LatencyTracker`/`HealthStatus` pair.

use crate::state::{ProjectState, TaskStatus};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulates named latency samples (one per phase or task) and reports
/// p50-ish summaries via `tracing`. Not persisted — purely a diagnostic
/// aid for the `taskpilot` binary's stderr output.
#[derive(Default)]
pub struct LatencyTracker {
    samples: HashMap<String, Vec<Duration>>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: impl Into<String>, elapsed: Duration) {
        self.samples.entry(label.into()).or_default().push(elapsed);
    }

    /// Time a closure and record its elapsed duration under `label`.
    pub fn time<T>(&mut self, label: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record(label, start.elapsed());
        result
    }

    pub fn total(&self, label: &str) -> Duration {
        self.samples
            .get(label)
            .map(|v| v.iter().sum())
            .unwrap_or_default()
    }

    pub fn count(&self, label: &str) -> usize {
        self.samples.get(label).map(Vec::len).unwrap_or(0)
    }

    /// Logs one summary line per tracked label, tagged with `run_id` so
    /// entries from concurrent or successive runs can be told apart in
    /// aggregated log output.
    pub fn log_summary(&self, run_id: &str) {
        for (label, samples) in &self.samples {
            let total: Duration = samples.iter().sum();
            tracing::info!(
                run_id = run_id,
                label = label,
                count = samples.len(),
                total_ms = total.as_millis(),
                "latency summary"
            );
        }
    }
}

/// A snapshot of task-graph progress, for `taskpilot show` and for deciding
/// whether a resumed run has anything left to do.
#[derive(Debug, Clone)]
pub struct StateHealth {
    pub run_id: String,
    pub phase: &'static str,
    pub blocked_reason: Option<String>,
    pub tasks_total: usize,
    pub tasks_done: usize,
    pub tasks_pending: usize,
    pub tasks_in_progress: usize,
    pub tasks_deferred: usize,
    pub tasks_failed: usize,
    pub tasks_terminated: usize,
}

pub fn summarize(state: &ProjectState) -> StateHealth {
    let mut health = StateHealth {
        run_id: state.run_id.clone(),
        phase: state.phase.as_str(),
        blocked_reason: state.blocked_reason.clone(),
        tasks_total: state.tasks.len(),
        tasks_done: 0,
        tasks_pending: 0,
        tasks_in_progress: 0,
        tasks_deferred: 0,
        tasks_failed: 0,
        tasks_terminated: 0,
    };
    for t in &state.tasks {
        match t.status {
            TaskStatus::Done => health.tasks_done += 1,
            TaskStatus::Pending => health.tasks_pending += 1,
            TaskStatus::InProgress | TaskStatus::InReview => health.tasks_in_progress += 1,
            TaskStatus::Deferred => health.tasks_deferred += 1,
            TaskStatus::Failed => health.tasks_failed += 1,
            TaskStatus::Terminated => health.tasks_terminated += 1,
        }
    }
    health
}
