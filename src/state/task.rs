//! Task entity — unit of work tracked by the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordinal tier of a task. Drives scheduling order and gate assignment.
/// `CORE` is lowest, `WORKFLOW` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskLayer {
    Core,
    Infra,
    Algorithm,
    Workflow,
    /// Validation tasks (e.g. the synthesized integration task) sort last.
    Validation,
}

impl TaskLayer {
    /// Ordinal position used for sorting and "strictly lower layer" comparisons.
    pub fn rank(self) -> u8 {
        match self {
            TaskLayer::Core => 0,
            TaskLayer::Infra => 1,
            TaskLayer::Algorithm => 2,
            TaskLayer::Workflow => 3,
            TaskLayer::Validation => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    New,
    Extend,
    Fix,
    Test,
    Integration,
    ExternalDependency,
    Algorithm,
    Data,
    Research,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskScope {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    InReview,
    Done,
    Failed,
    Deferred,
    Terminated,
}

/// The kind of automated quality gate a task must pass before it is `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    Build,
    Unit,
    Lint,
    Contract,
    Numeric,
}

impl GateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GateKind::Build => "build",
            GateKind::Unit => "unit",
            GateKind::Lint => "lint",
            GateKind::Contract => "contract",
            GateKind::Numeric => "numeric",
        }
    }
}

/// A unit of work created by `decompose` and driven to completion by the
/// execute/verify orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub layer: TaskLayer,
    pub kind: TaskKind,
    pub scope: TaskScope,
    /// Selects the specialist backend responsible for this task.
    pub specialist_tag: String,
    pub status: TaskStatus,
    /// Current dependency ids. May be a strict subset of `original_dependencies`
    /// when some have been suspended by a defer mutation (invariant 2/3).
    pub dependencies: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub anticipated_files: Vec<String>,
    pub required_gates: Vec<GateKind>,
    /// "TASK-ID:condition" — set only while status is `Deferred` (invariant 7).
    pub defer_trigger: Option<String>,
    /// Snapshot of `dependencies` taken the first time this task is ever
    /// deferred. Once set, `dependencies ∪ suspended_dependencies` must equal
    /// this set for the lifetime of the task (invariant 3).
    pub original_dependencies: Option<Vec<String>>,
    /// Dependency ids temporarily removed from `dependencies` by a defer
    /// mutation upstream of this task.
    pub suspended_dependencies: Vec<String>,
    pub spec_doc_ref: Option<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Task {
    /// Every dependency the task has ever carried, deferred or not.
    /// Equals `dependencies ∪ suspended_dependencies` (invariant 3).
    pub fn all_dependencies(&self) -> Vec<String> {
        let mut all = self.dependencies.clone();
        all.extend(self.suspended_dependencies.iter().cloned());
        all
    }

    pub fn is_runnable_status(&self) -> bool {
        matches!(self.status, TaskStatus::Pending)
    }
}

/// Builder-style constructor used by `decompose` and tests — keeps the
/// exhaustive `Task` struct literal out of call sites, the way
/// `AgentRecord` construction is centralized inside `Orchestrator::spawn`.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            task: Task {
                id: id.into(),
                title: title.into(),
                description: String::new(),
                layer: TaskLayer::Core,
                kind: TaskKind::New,
                scope: TaskScope::Medium,
                specialist_tag: "generalist".to_string(),
                status: TaskStatus::Pending,
                dependencies: Vec::new(),
                acceptance_criteria: Vec::new(),
                anticipated_files: Vec::new(),
                required_gates: Vec::new(),
                defer_trigger: None,
                original_dependencies: None,
                suspended_dependencies: Vec::new(),
                spec_doc_ref: None,
                metadata: HashMap::new(),
            },
        }
    }

    pub fn description(mut self, d: impl Into<String>) -> Self {
        self.task.description = d.into();
        self
    }

    pub fn layer(mut self, l: TaskLayer) -> Self {
        self.task.layer = l;
        self
    }

    pub fn kind(mut self, k: TaskKind) -> Self {
        self.task.kind = k;
        self
    }

    pub fn scope(mut self, s: TaskScope) -> Self {
        self.task.scope = s;
        self
    }

    pub fn specialist_tag(mut self, tag: impl Into<String>) -> Self {
        self.task.specialist_tag = tag.into();
        self
    }

    pub fn dependencies(mut self, deps: Vec<String>) -> Self {
        self.task.dependencies = deps;
        self
    }

    pub fn acceptance_criteria(mut self, ac: Vec<String>) -> Self {
        self.task.acceptance_criteria = ac;
        self
    }

    pub fn anticipated_files(mut self, files: Vec<String>) -> Self {
        self.task.anticipated_files = files;
        self
    }

    pub fn required_gates(mut self, gates: Vec<GateKind>) -> Self {
        self.task.required_gates = gates;
        self
    }

    pub fn spec_doc_ref(mut self, r: impl Into<String>) -> Self {
        self.task.spec_doc_ref = Some(r.into());
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}
