//! Execute/verify orchestrator — the innermost engine: a single-threaded
//! cooperative loop over `brief -> specialist -> review -> gates ->
//! integration`, with bounded retry budgets and a resumable pause.

use crate::backends::{Brief, GateRegistry, IntegrationRunner, Reviewer, Specialist};
use crate::error::{OrchestratorError, Result};
use crate::scheduler;
use crate::state::{
    gate_key, DecisionKind, Draft, GateStatus, IntegrationTest, Phase, ProjectState, Task,
    TaskStatus,
};

pub const MAX_REVISIONS: u32 = 3;
pub const MAX_GATE_RETRIES: u32 = 2;

/// A hook invoked at every persistence point: after each task's completion,
/// and before every return from the orchestrator.
pub type Persister<'a> = dyn FnMut(&ProjectState) -> Result<()> + 'a;

pub struct Orchestrator<'a> {
    pub specialist: &'a dyn Specialist,
    pub reviewer: &'a dyn Reviewer,
    pub gate_registry: &'a dyn GateRegistry,
    pub integration_runner: &'a dyn IntegrationRunner,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        specialist: &'a dyn Specialist,
        reviewer: &'a dyn Reviewer,
        gate_registry: &'a dyn GateRegistry,
        integration_runner: &'a dyn IntegrationRunner,
    ) -> Self {
        Self {
            specialist,
            reviewer,
            gate_registry,
            integration_runner,
        }
    }

    /// Assemble the transient per-task context bundle.
    fn assemble_brief(&self, state: &ProjectState, task: &Task, feedback: Option<String>, previous_draft: Option<Draft>) -> Brief {
        let relevant_audit_items = state
            .audit_items
            .iter()
            .filter(|item| {
                task.description.contains(&item.component)
                    || item
                        .matched_term()
                        .map(|term| task.description.contains(term))
                        .unwrap_or(false)
            })
            .cloned()
            .collect();

        let dependency_drafts = task
            .dependencies
            .iter()
            .filter(|dep_id| state.task(dep_id).map(|t| t.status) == Some(TaskStatus::Done))
            .filter_map(|dep_id| state.drafts.get(dep_id).cloned().map(|d| (dep_id.clone(), d)))
            .collect();

        Brief {
            task: task.clone(),
            relevant_audit_items,
            dependency_drafts,
            feedback,
            previous_draft,
        }
    }

    fn synthesize_integration_test(&self, state: &ProjectState) -> IntegrationTest {
        IntegrationTest {
            name: format!("integration-of-{}-tasks", state.tasks.len()),
            covered_task_ids: state.tasks.iter().map(|t| t.id.clone()).collect(),
            description: "synthesized cross-task integration test".to_string(),
        }
    }

    async fn run_integration(&self, state: &mut ProjectState) -> Result<()> {
        let test = self.synthesize_integration_test(state);
        let result = self
            .integration_runner
            .run(&test)
            .await
            .map_err(|e| OrchestratorError::Backend(e.to_string()))?;
        let passed = result.passed;
        state.integration_results.push(result);
        state.phase = if passed { Phase::Integrate } else { Phase::Decompose };
        state.record_event(
            "integration",
            if passed { "integration passed" } else { "integration failed, returning to decompose" },
        );
        Ok(())
    }

    /// Drive one task through revision, review, and gate loops. Returns
    /// `Ok(true)` if the task reached `DONE`, `Ok(false)` if the orchestrator
    /// should return to the caller immediately (pause or phase change already
    /// recorded in `state`).
    async fn drive_task(&self, state: &mut ProjectState, task_id: &str) -> Result<bool> {
        state.current_task_id = Some(task_id.to_string());
        state.task_mut(task_id).expect("selected by scheduler").status = TaskStatus::InProgress;

        let mut feedback: Option<String> = None;
        let mut prev_draft: Option<Draft> = None;
        let mut approved = false;

        for _attempt in 0..MAX_REVISIONS {
            let task_snapshot = state.task(task_id).expect("exists").clone();
            let brief = self.assemble_brief(state, &task_snapshot, feedback.clone(), prev_draft.clone());
            let draft = self
                .specialist
                .execute(&brief)
                .await
                .map_err(|e| OrchestratorError::Backend(e.to_string()))?;
            state.drafts.insert(task_id.to_string(), draft.clone());

            let decision = self
                .reviewer
                .review(&task_snapshot, &draft)
                .await
                .map_err(|e| OrchestratorError::Backend(e.to_string()))?;
            state.human_decisions.push(decision.clone());

            match decision.kind {
                DecisionKind::Approve => {
                    approved = true;
                    break;
                }
                DecisionKind::Reject => {
                    state.task_mut(task_id).expect("exists").status = TaskStatus::Failed;
                    state.current_task_id = None;
                    state.phase = Phase::Decompose;
                    return Ok(false);
                }
                DecisionKind::Pause => {
                    state.blocked_reason = decision.feedback;
                    return Ok(false);
                }
                DecisionKind::Revise => {
                    feedback = decision.feedback;
                    prev_draft = Some(draft);
                }
            }
        }

        if !approved {
            state.blocked_reason = Some(format!("max revisions reached for {task_id}"));
            return Ok(false);
        }

        if !self.run_gates(state, task_id).await? {
            return Ok(false);
        }

        state.task_mut(task_id).expect("exists").status = TaskStatus::Done;
        state.current_task_id = None;
        Ok(true)
    }

    /// Run (and, on failure, retry) the gate loop for a task that has just
    /// been approved. Returns `Ok(true)` iff gates ultimately pass (or the
    /// task has none).
    async fn run_gates(&self, state: &mut ProjectState, task_id: &str) -> Result<bool> {
        let required_gates = state.task(task_id).expect("exists").required_gates.clone();
        if required_gates.is_empty() {
            return Ok(true);
        }

        let mut draft = state.drafts.get(task_id).cloned().expect("approved draft exists");

        for gate_attempt in 0..=MAX_GATE_RETRIES {
            let task_snapshot = state.task(task_id).expect("exists").clone();
            let results = self
                .gate_registry
                .run_all(&task_snapshot, &draft)
                .await
                .map_err(|e| OrchestratorError::Backend(e.to_string()))?;
            let all_pass = results.iter().all(|r| r.status == GateStatus::Pass);
            let failing: Vec<String> = results
                .iter()
                .filter(|r| r.status != GateStatus::Pass)
                .map(|r| r.raw_output.clone())
                .collect();
            for r in results {
                state.gate_results.insert(gate_key(&r.task_id, r.gate_kind), r);
            }

            if all_pass {
                return Ok(true);
            }

            if gate_attempt < MAX_GATE_RETRIES {
                let brief = self.assemble_brief(
                    state,
                    &task_snapshot,
                    Some(failing.join("; ")),
                    Some(draft.clone()),
                );
                draft = self
                    .specialist
                    .execute(&brief)
                    .await
                    .map_err(|e| OrchestratorError::Backend(e.to_string()))?;
                state.drafts.insert(task_id.to_string(), draft.clone());
            } else {
                let decision = self
                    .reviewer
                    .review_gate_failure(&task_snapshot)
                    .await
                    .map_err(|e| OrchestratorError::Backend(e.to_string()))?;
                match decision.kind {
                    // One-shot bypass for the current task only.
                    DecisionKind::Approve => return Ok(true),
                    DecisionKind::Pause => {
                        state.blocked_reason = decision.feedback;
                        return Ok(false);
                    }
                    _ => {
                        state.blocked_reason =
                            Some(format!("gate retries exhausted for {task_id}"));
                        return Ok(false);
                    }
                }
            }
        }
        Ok(false)
    }

    /// Run the cooperative loop until the task graph is drained (then runs
    /// integration) or a suspension point is reached.
    pub async fn run(&self, mut state: ProjectState, mut persist: Option<&mut Persister<'_>>) -> Result<ProjectState> {
        loop {
            let Some(task_id) = scheduler::select_next_task(&state).map(|t| t.id.clone()) else {
                self.run_integration(&mut state).await?;
                if let Some(p) = persist.as_mut() {
                    p(&state)?;
                }
                return Ok(state);
            };

            let completed = self.drive_task(&mut state, &task_id).await?;
            if !completed {
                if let Some(p) = persist.as_mut() {
                    p(&state)?;
                }
                return Ok(state);
            }

            scheduler::check_deferred_triggers(&mut state, &task_id);
            state.record_event("task_complete", task_id.clone());
            if let Some(p) = persist.as_mut() {
                p(&state)?;
            }
        }
    }
}
