//! Deterministic mock backends — used by the test suite and by `taskpilot
//! run`'s toy default (mock implementations live next to real ones
//! for tests").

use crate::backends::{
    Brief, BranchEntry, BranchRegistry, CapabilityHit, CapabilityRegistry, GateRegistry,
    GateRunner, IntegrationRunner, Reviewer, Specialist,
};
use crate::state::{
    Decision, DecisionKind, Draft, GateKind, GateResult, GateStatus, IntegrationResult,
    IntegrationTest, Task,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// Specialist that always produces a trivial one-file draft, echoing the
/// task title and any feedback it was given.
pub struct MockSpecialist;

#[async_trait]
impl Specialist for MockSpecialist {
    async fn execute(&self, brief: &Brief) -> anyhow::Result<Draft> {
        let mut draft = Draft::new(brief.task.id.clone());
        let path = brief
            .task
            .anticipated_files
            .first()
            .cloned()
            .unwrap_or_else(|| format!("src/{}.rs", brief.task.id.to_lowercase()));
        let mut body = format!("// generated for {}\n", brief.task.title);
        if let Some(fb) = &brief.feedback {
            body.push_str(&format!("// addressing feedback: {fb}\n"));
        }
        draft.files.insert(path, body);
        draft.explanation = format!("Implements {}", brief.task.title);
        Ok(draft)
    }
}

/// Reviewer that replays a fixed queue of decisions, one per call, then
/// repeats the last decision once the queue is drained — used to script
/// scenarios like "revise, revise, approve".
pub struct ScriptedReviewer {
    queue: Mutex<VecDeque<Decision>>,
    gate_failure_decision: Decision,
}

impl ScriptedReviewer {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self {
            queue: Mutex::new(decisions.into()),
            gate_failure_decision: Decision {
                task_id: String::new(),
                kind: DecisionKind::Pause,
                feedback: Some("gate failures exhausted retries".to_string()),
            },
        }
    }

    /// A reviewer that always approves — the common case in tests.
    pub fn always_approve() -> Self {
        Self::new(vec![])
    }
}

#[async_trait]
impl Reviewer for ScriptedReviewer {
    async fn review(&self, task: &Task, _draft: &Draft) -> anyhow::Result<Decision> {
        let mut queue = self.queue.lock().await;
        let decision = queue.pop_front().unwrap_or(Decision {
            task_id: task.id.clone(),
            kind: DecisionKind::Approve,
            feedback: None,
        });
        Ok(Decision {
            task_id: task.id.clone(),
            ..decision
        })
    }

    async fn review_gate_failure(&self, task: &Task) -> anyhow::Result<Decision> {
        Ok(Decision {
            task_id: task.id.clone(),
            ..self.gate_failure_decision.clone()
        })
    }
}

/// Gate runner that replays a fixed per-kind sequence of statuses, defaulting
/// to `Pass` once a kind's queue is drained.
pub struct ScriptedGateRunner {
    scripts: Mutex<HashMap<GateKind, VecDeque<GateStatus>>>,
}

impl ScriptedGateRunner {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
        }
    }

    /// Queue a sequence of statuses to return for a given gate kind, in
    /// order, one per call. Must be set up before the runner is shared
    /// across tasks (construction time — no contention yet).
    pub fn script(self, kind: GateKind, statuses: Vec<GateStatus>) -> Self {
        {
            let mut scripts = self
                .scripts
                .try_lock()
                .expect("script() must run before concurrent use");
            scripts.insert(kind, statuses.into());
        }
        self
    }
}

impl Default for ScriptedGateRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GateRunner for ScriptedGateRunner {
    async fn run(&self, task: &Task, _draft: &Draft, kind: GateKind) -> anyhow::Result<GateResult> {
        let mut scripts = self.scripts.lock().await;
        let status = scripts
            .get_mut(&kind)
            .and_then(|q| q.pop_front())
            .unwrap_or(GateStatus::Pass);
        Ok(GateResult {
            task_id: task.id.clone(),
            gate_kind: kind,
            status,
            raw_output: format!("{:?} gate {:?} for {}", kind, status, task.id),
        })
    }
}

/// Runs every gate a task requires through a shared `GateRunner`.
pub struct SimpleGateRegistry<R: GateRunner> {
    runner: R,
}

impl<R: GateRunner> SimpleGateRegistry<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl<R: GateRunner + Sync> GateRegistry for SimpleGateRegistry<R> {
    async fn run_all(&self, task: &Task, draft: &Draft) -> anyhow::Result<Vec<GateResult>> {
        let mut results = Vec::new();
        for kind in &task.required_gates {
            results.push(self.runner.run(task, draft, *kind).await?);
        }
        Ok(results)
    }
}

/// Integration runner that always reports success, covering every task id
/// named in the synthesized test.
pub struct AlwaysPassIntegrationRunner;

#[async_trait]
impl IntegrationRunner for AlwaysPassIntegrationRunner {
    async fn run(&self, test: &IntegrationTest) -> anyhow::Result<IntegrationResult> {
        Ok(IntegrationResult {
            test_name: test.name.clone(),
            passed: true,
            output: "all covered tasks integrate cleanly".to_string(),
            covered_task_ids: test.covered_task_ids.clone(),
        })
    }
}

/// In-memory capability registry backed by a component -> category -> value map.
#[derive(Default)]
pub struct InMemoryCapabilityRegistry {
    capabilities: HashMap<String, HashMap<String, String>>,
    non_developable: Vec<String>,
}

impl InMemoryCapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capability(
        mut self,
        component: impl Into<String>,
        category: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.capabilities
            .entry(component.into())
            .or_default()
            .insert(category.into(), value.into());
        self
    }

    pub fn with_non_developable(mut self, component: impl Into<String>) -> Self {
        self.non_developable.push(component.into());
        self
    }
}

impl CapabilityRegistry for InMemoryCapabilityRegistry {
    fn has(&self, component: &str, category: &str, value: &str) -> bool {
        self.capabilities
            .get(component)
            .and_then(|c| c.get(category))
            .map(|v| v == value)
            .unwrap_or(false)
    }

    fn get(&self, component: &str, category: &str) -> Option<String> {
        self.capabilities.get(component)?.get(category).cloned()
    }

    fn search(&self, keyword: &str) -> Vec<CapabilityHit> {
        let mut hits = Vec::new();
        for (component, categories) in &self.capabilities {
            if component.contains(keyword) {
                for (category, value) in categories {
                    hits.push(CapabilityHit {
                        component: component.clone(),
                        category: category.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        hits
    }

    fn is_developable(&self, component: &str) -> bool {
        !self.non_developable.iter().any(|c| c == component)
    }
}

/// Branch registry with no branches active — the common test default.
#[derive(Default)]
pub struct EmptyBranchRegistry;

impl BranchRegistry for EmptyBranchRegistry {
    fn get_in_progress(&self, _component: &str) -> Vec<BranchEntry> {
        Vec::new()
    }

    fn has_in_progress(&self, _capability_keyword: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TaskBuilder;

    #[tokio::test]
    async fn mock_specialist_produces_well_formed_draft() {
        let specialist = MockSpecialist;
        let task = TaskBuilder::new("T-1", "Add auth").build();
        let brief = Brief {
            task,
            relevant_audit_items: vec![],
            dependency_drafts: HashMap::new(),
            feedback: None,
            previous_draft: None,
        };
        let draft = specialist.execute(&brief).await.unwrap();
        assert!(draft.is_well_formed());
    }

    #[tokio::test]
    async fn scripted_reviewer_replays_queue_then_defaults_to_approve() {
        let reviewer = ScriptedReviewer::new(vec![Decision {
            task_id: String::new(),
            kind: DecisionKind::Revise,
            feedback: Some("add tests".to_string()),
        }]);
        let task = TaskBuilder::new("T-1", "demo").build();
        let draft = Draft::new("T-1");

        let first = reviewer.review(&task, &draft).await.unwrap();
        assert_eq!(first.kind, DecisionKind::Revise);

        let second = reviewer.review(&task, &draft).await.unwrap();
        assert_eq!(second.kind, DecisionKind::Approve);
    }

    #[tokio::test]
    async fn scripted_gate_runner_fails_then_passes() {
        let runner = ScriptedGateRunner::new().script(
            GateKind::Unit,
            vec![GateStatus::Fail, GateStatus::Pass],
        );
        let task = TaskBuilder::new("T-1", "demo").build();
        let draft = Draft::new("T-1");

        let first = runner.run(&task, &draft, GateKind::Unit).await.unwrap();
        assert_eq!(first.status, GateStatus::Fail);

        let second = runner.run(&task, &draft, GateKind::Unit).await.unwrap();
        assert_eq!(second.status, GateStatus::Pass);

        let third = runner.run(&task, &draft, GateKind::Unit).await.unwrap();
        assert_eq!(third.status, GateStatus::Pass);
    }
}
