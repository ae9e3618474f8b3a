//! ProjectState — the root aggregate.
//!
//! The state object exclusively owns its tasks, drafts, gate results, etc.
//! Sub-entities are never referenced from outside the state except as
//! transient copies passed into backends, which must not retain them across
//! calls.

use crate::error::{OrchestratorError, Result};
use crate::state::audit::AuditItem;
use crate::state::decision::{BrainstormResult, Decision, HumanApproval, ReviewResult};
use crate::state::draft::Draft;
use crate::state::gate::GateResult;
use crate::state::integration::IntegrationResult;
use crate::state::task::{Task, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Intake,
    Audit,
    Decompose,
    Execute,
    Verify,
    Integrate,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Intake => "intake",
            Phase::Audit => "audit",
            Phase::Decompose => "decompose",
            Phase::Execute => "execute",
            Phase::Verify => "verify",
            Phase::Integrate => "integrate",
        }
    }
}

/// One entry in the append-only diagnostic history log. Not read by any
/// core operation — exists purely for `taskpilot show --history`, the way
/// `tasks::events::TeEvent` is additive to, not load-bearing for, task state
/// transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEvent {
    pub seq: u64,
    pub kind: String,
    pub detail: String,
}

fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectState {
    /// Correlation id for this run, stamped once at creation and carried
    /// through every log line and persisted snapshot. Missing on older
    /// persisted state (before this field existed), in which case loading
    /// it back mints a fresh one rather than failing.
    #[serde(default = "new_run_id")]
    pub run_id: String,
    pub raw_request: String,
    #[serde(default)]
    pub parsed_intent: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub audit_items: Vec<AuditItem>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub current_task_id: Option<String>,
    #[serde(default)]
    pub drafts: HashMap<String, Draft>,
    #[serde(default)]
    pub gate_results: HashMap<String, GateResult>,
    #[serde(default)]
    pub integration_results: Vec<IntegrationResult>,
    pub phase: Phase,
    #[serde(default)]
    pub human_decisions: Vec<Decision>,
    #[serde(default)]
    pub blocked_reason: Option<String>,
    #[serde(default)]
    pub review_results: Vec<ReviewResult>,
    #[serde(default)]
    pub human_approvals: Vec<HumanApproval>,
    #[serde(default)]
    pub brainstorm_results: Vec<BrainstormResult>,
    #[serde(default)]
    pub optimization_history: Vec<String>,
    #[serde(default)]
    pub last_optimization: Option<String>,
    #[serde(default)]
    pub optimization_metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub history: Vec<StateEvent>,
}

impl ProjectState {
    pub fn new(raw_request: impl Into<String>) -> Self {
        Self {
            run_id: new_run_id(),
            raw_request: raw_request.into(),
            parsed_intent: HashMap::new(),
            audit_items: Vec::new(),
            tasks: Vec::new(),
            current_task_id: None,
            drafts: HashMap::new(),
            gate_results: HashMap::new(),
            integration_results: Vec::new(),
            phase: Phase::Intake,
            human_decisions: Vec::new(),
            blocked_reason: None,
            review_results: Vec::new(),
            human_approvals: Vec::new(),
            brainstorm_results: Vec::new(),
            optimization_history: Vec::new(),
            last_optimization: None,
            optimization_metadata: serde_json::Map::new(),
            history: Vec::new(),
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn has_task(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Record a diagnostic history entry (not invariant-bearing).
    pub fn record_event(&mut self, kind: impl Into<String>, detail: impl Into<String>) {
        let seq = self.history.len() as u64;
        self.history.push(StateEvent {
            seq,
            kind: kind.into(),
            detail: detail.into(),
        });
    }

    /// Invariant 1 & 2: every dependency id resolves to a task in the state
    /// (unless suspended), and ids are unique.
    pub fn check_dependency_integrity(&self) -> Result<()> {
        let ids: HashSet<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        if ids.len() != self.tasks.len() {
            return Err(OrchestratorError::DuplicateTask(
                "duplicate task id detected".to_string(),
            ));
        }
        for t in &self.tasks {
            for dep in &t.dependencies {
                if !ids.contains(dep.as_str()) {
                    return Err(OrchestratorError::UnknownTask(dep.clone()));
                }
            }
        }
        Ok(())
    }

    /// Invariant 4: the dependency graph is acyclic.
    pub fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }
        let mut marks: HashMap<&str, Mark> = self
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), Mark::Unvisited))
            .collect();

        fn visit<'a>(
            id: &'a str,
            state: &'a ProjectState,
            marks: &mut HashMap<&'a str, Mark>,
        ) -> Result<()> {
            match marks.get(id).copied() {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::InProgress) => {
                    return Err(OrchestratorError::CycleDetected(id.to_string()))
                }
                _ => {}
            }
            marks.insert(id, Mark::InProgress);
            if let Some(task) = state.task(id) {
                for dep in &task.dependencies {
                    visit(dep.as_str(), state, marks)?;
                }
            }
            marks.insert(id, Mark::Done);
            Ok(())
        }

        for t in &self.tasks {
            visit(t.id.as_str(), self, &mut marks)?;
        }
        Ok(())
    }

    /// Invariant 5: `current_task_id` is set iff some task is `InProgress`.
    pub fn check_current_task_invariant(&self) -> Result<()> {
        let any_in_progress = self
            .tasks
            .iter()
            .any(|t| t.status == TaskStatus::InProgress);
        match (&self.current_task_id, any_in_progress) {
            (Some(id), true) => {
                if self.task(id).map(|t| t.status) != Some(TaskStatus::InProgress) {
                    return Err(OrchestratorError::InvalidTaskStatus {
                        task: id.clone(),
                        status: "current_task_id does not point at the in-progress task"
                            .to_string(),
                    });
                }
                Ok(())
            }
            (None, false) => Ok(()),
            (Some(id), false) => Err(OrchestratorError::InvalidTaskStatus {
                task: id.clone(),
                status: "current_task_id set but no task is in progress".to_string(),
            }),
            (None, true) => Err(OrchestratorError::InvalidTaskStatus {
                task: "?".to_string(),
                status: "a task is in progress but current_task_id is unset".to_string(),
            }),
        }
    }

    /// Invariant 7: a `Deferred` task's `defer_trigger` is a non-empty
    /// "TASK-ID:condition" string.
    pub fn check_defer_triggers(&self) -> Result<()> {
        for t in &self.tasks {
            if t.status == TaskStatus::Deferred {
                match &t.defer_trigger {
                    Some(trig) if trig.contains(':') && !trig.is_empty() => {}
                    _ => {
                        return Err(OrchestratorError::InvalidTrigger {
                            task: t.id.clone(),
                            reason: "deferred task must carry a non-empty TASK:condition trigger"
                                .to_string(),
                        })
                    }
                }
            }
        }
        Ok(())
    }

    /// Invariant 3: once a task has ever been deferred, `original_dependencies`
    /// is set, and `dependencies ∪ suspended_dependencies` (as sets) equals it
    /// for the rest of the task's life.
    pub fn check_original_dependencies_consistency(&self) -> Result<()> {
        for t in &self.tasks {
            let Some(original) = &t.original_dependencies else {
                continue;
            };
            let original: HashSet<&str> = original.iter().map(String::as_str).collect();
            let current: HashSet<&str> = t
                .dependencies
                .iter()
                .chain(t.suspended_dependencies.iter())
                .map(String::as_str)
                .collect();
            if original != current {
                return Err(OrchestratorError::InvariantViolation {
                    task: t.id.clone(),
                    detail: "dependencies ∪ suspended_dependencies no longer matches \
                             original_dependencies"
                        .to_string(),
                });
            }
        }
        Ok(())
    }

    /// Invariant 8: every `gate_results` key is `"<task_id>:<gate_kind>"` and
    /// names an existing task with a matching `gate_kind`.
    pub fn check_gate_key_format(&self) -> Result<()> {
        for (key, result) in &self.gate_results {
            let Some((task_id, kind_str)) = crate::state::gate::split_gate_key(key) else {
                return Err(OrchestratorError::InvariantViolation {
                    task: key.clone(),
                    detail: "gate_results key is not of the form <task_id>:<gate_kind>"
                        .to_string(),
                });
            };
            if task_id != result.task_id || kind_str != result.gate_kind.as_str() {
                return Err(OrchestratorError::InvariantViolation {
                    task: task_id.to_string(),
                    detail: format!(
                        "gate_results key {key} does not match its GateResult \
                         (task_id={}, gate_kind={})",
                        result.task_id,
                        result.gate_kind.as_str()
                    ),
                });
            }
            if !self.has_task(task_id) {
                return Err(OrchestratorError::UnknownTask(task_id.to_string()));
            }
        }
        Ok(())
    }

    /// Invariant 6: `blocked_reason` is only set once the run has reached
    /// `Execute` or a later phase.
    pub fn check_blocked_reason_phase(&self) -> Result<()> {
        if self.blocked_reason.is_some() {
            let reached_execute = matches!(
                self.phase,
                Phase::Execute | Phase::Verify | Phase::Integrate
            );
            if !reached_execute {
                return Err(OrchestratorError::InvariantViolation {
                    task: "?".to_string(),
                    detail: format!(
                        "blocked_reason is set but phase is {}, before execute",
                        self.phase.as_str()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Run every invariant check. Called after every mutation
    /// that touches the task graph.
    pub fn check_all_invariants(&self) -> Result<()> {
        self.check_dependency_integrity()?;
        self.check_acyclic()?;
        self.check_current_task_invariant()?;
        self.check_defer_triggers()?;
        self.check_original_dependencies_consistency()?;
        self.check_gate_key_format()?;
        self.check_blocked_reason_phase()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::task::TaskBuilder;

    fn task(id: &str, deps: &[&str]) -> Task {
        TaskBuilder::new(id, id)
            .dependencies(deps.iter().map(|s| s.to_string()).collect())
            .build()
    }

    #[test]
    fn empty_state_passes_all_invariants() {
        let s = ProjectState::new("demo");
        assert!(s.check_all_invariants().is_ok());
    }

    #[test]
    fn dangling_dependency_is_rejected() {
        let mut s = ProjectState::new("demo");
        s.tasks.push(task("T-1", &["T-missing"]));
        assert!(matches!(
            s.check_dependency_integrity(),
            Err(OrchestratorError::UnknownTask(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut s = ProjectState::new("demo");
        s.tasks.push(task("T-1", &[]));
        s.tasks.push(task("T-1", &[]));
        assert!(matches!(
            s.check_dependency_integrity(),
            Err(OrchestratorError::DuplicateTask(_))
        ));
    }

    #[test]
    fn cycle_is_detected() {
        let mut s = ProjectState::new("demo");
        s.tasks.push(task("T-1", &["T-2"]));
        s.tasks.push(task("T-2", &["T-1"]));
        assert!(matches!(
            s.check_acyclic(),
            Err(OrchestratorError::CycleDetected(_))
        ));
    }

    #[test]
    fn acyclic_dag_passes() {
        let mut s = ProjectState::new("demo");
        s.tasks.push(task("T-1", &[]));
        s.tasks.push(task("T-2", &["T-1"]));
        s.tasks.push(task("T-3", &["T-2"]));
        assert!(s.check_acyclic().is_ok());
    }

    #[test]
    fn current_task_must_match_in_progress_task() {
        let mut s = ProjectState::new("demo");
        let mut t = task("T-1", &[]);
        t.status = TaskStatus::InProgress;
        s.tasks.push(t);
        s.current_task_id = Some("T-1".to_string());
        assert!(s.check_current_task_invariant().is_ok());

        s.current_task_id = None;
        assert!(s.check_current_task_invariant().is_err());
    }

    #[test]
    fn deferred_task_without_trigger_is_rejected() {
        let mut s = ProjectState::new("demo");
        let mut t = task("T-1", &[]);
        t.status = TaskStatus::Deferred;
        t.defer_trigger = None;
        s.tasks.push(t);
        assert!(s.check_defer_triggers().is_err());
    }

    #[test]
    fn original_dependencies_must_match_union_after_defer() {
        let mut s = ProjectState::new("demo");
        let mut t = task("T-1", &["T-2"]);
        t.original_dependencies = Some(vec!["T-2".to_string()]);
        s.tasks.push(t);
        s.tasks.push(task("T-2", &[]));
        assert!(s.check_original_dependencies_consistency().is_ok());

        // Suspend the dependency without recording it — union no longer matches.
        s.tasks[0].dependencies.clear();
        assert!(matches!(
            s.check_original_dependencies_consistency(),
            Err(OrchestratorError::InvariantViolation { .. })
        ));

        // Recording it as suspended restores the union.
        s.tasks[0].suspended_dependencies.push("T-2".to_string());
        assert!(s.check_original_dependencies_consistency().is_ok());
    }

    #[test]
    fn gate_key_must_match_its_gate_result() {
        use crate::state::gate::{GateResult, GateStatus};
        use crate::state::task::GateKind;

        let mut s = ProjectState::new("demo");
        s.tasks.push(task("T-1", &[]));
        s.gate_results.insert(
            "T-1:unit".to_string(),
            GateResult {
                task_id: "T-1".to_string(),
                gate_kind: GateKind::Unit,
                status: GateStatus::Pass,
                raw_output: String::new(),
            },
        );
        assert!(s.check_gate_key_format().is_ok());

        s.gate_results.insert(
            "T-1:lint".to_string(),
            GateResult {
                task_id: "T-1".to_string(),
                gate_kind: GateKind::Unit,
                status: GateStatus::Pass,
                raw_output: String::new(),
            },
        );
        assert!(matches!(
            s.check_gate_key_format(),
            Err(OrchestratorError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn blocked_reason_before_execute_is_rejected() {
        let mut s = ProjectState::new("demo");
        s.phase = Phase::Audit;
        s.blocked_reason = Some("stuck".to_string());
        assert!(matches!(
            s.check_blocked_reason_phase(),
            Err(OrchestratorError::InvariantViolation { .. })
        ));

        s.phase = Phase::Execute;
        assert!(s.check_blocked_reason_phase().is_ok());
    }

    #[test]
    fn serde_roundtrip_preserves_phase_lowercase() {
        let s = ProjectState::new("demo");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["phase"], "intake");
        let back: ProjectState = serde_json::from_value(json).unwrap();
        assert_eq!(back.phase, Phase::Intake);
    }

    #[test]
    fn missing_optional_fields_default_to_empty() {
        let minimal = serde_json::json!({
            "raw_request": "build a thing",
            "phase": "intake",
        });
        let s: ProjectState = serde_json::from_value(minimal).unwrap();
        assert!(s.tasks.is_empty());
        assert!(s.drafts.is_empty());
        assert!(s.optimization_history.is_empty());
        assert!(!s.run_id.is_empty());
    }

    #[test]
    fn each_new_state_gets_a_distinct_run_id() {
        let a = ProjectState::new("demo");
        let b = ProjectState::new("demo");
        assert_ne!(a.run_id, b.run_id);
    }
}
