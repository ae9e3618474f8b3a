//! External collaborator contracts — pluggable backend traits.
//!
//! These are explicit interface types rather than ad hoc duck typing. Mock
//! implementations live in `backends::mock`, next to the trait definitions,
//! for tests and for the CLI's toy `run` mode — the same way
//! `agents::reviewer`'s prompt/parse helpers live next to the orchestrator
//! that drives them.

pub mod mock;

use crate::state::{
    AuditItem, Decision, Draft, GateKind, GateResult, IntegrationResult, IntegrationTest, Task,
};
use async_trait::async_trait;
use std::collections::HashMap;

/// Transient context bundle assembled per task and passed to the specialist
/// — assembled fresh per task. Never retained by a backend across calls
/// , which owns its sub-entities exclusively.
#[derive(Debug, Clone)]
pub struct Brief {
    pub task: Task,
    /// Audit items whose matched term or component appears in the task's
    /// description.
    pub relevant_audit_items: Vec<AuditItem>,
    /// Drafts produced by each completed dependency, as interface contracts.
    pub dependency_drafts: HashMap<String, Draft>,
    /// Feedback from the most recent REVISE decision or gate failure, if any.
    pub feedback: Option<String>,
    /// The previous draft, if this is a revision attempt.
    pub previous_draft: Option<Draft>,
}

/// Turns a brief into a draft.
#[async_trait]
pub trait Specialist: Send + Sync {
    async fn execute(&self, brief: &Brief) -> anyhow::Result<Draft>;
}

/// Issues an approve/revise/reject/pause decision on a draft.
#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(&self, task: &Task, draft: &Draft) -> anyhow::Result<Decision>;
    async fn review_gate_failure(&self, task: &Task) -> anyhow::Result<Decision>;
}

/// Runs a single gate kind against a task's draft.
#[async_trait]
pub trait GateRunner: Send + Sync {
    async fn run(&self, task: &Task, draft: &Draft, kind: GateKind) -> anyhow::Result<GateResult>;
}

/// Runs every gate a task requires.
#[async_trait]
pub trait GateRegistry: Send + Sync {
    async fn run_all(&self, task: &Task, draft: &Draft) -> anyhow::Result<Vec<GateResult>>;
}

/// Executes a cross-task integration test once the task graph is drained.
#[async_trait]
pub trait IntegrationRunner: Send + Sync {
    async fn run(&self, test: &IntegrationTest) -> anyhow::Result<IntegrationResult>;
}

/// A single capability-registry hit.
#[derive(Debug, Clone)]
pub struct CapabilityHit {
    pub component: String,
    pub category: String,
    pub value: String,
}

/// Data source describing which components/capabilities already exist.
pub trait CapabilityRegistry: Send + Sync {
    fn has(&self, component: &str, category: &str, value: &str) -> bool;
    fn get(&self, component: &str, category: &str) -> Option<String>;
    fn search(&self, keyword: &str) -> Vec<CapabilityHit>;
    /// Default `true` when the component is absent from the registry.
    fn is_developable(&self, component: &str) -> bool {
        let _ = component;
        true
    }
}

/// An in-progress development branch targeting some capability.
#[derive(Debug, Clone)]
pub struct BranchEntry {
    pub branch_name: String,
    pub target_capabilities: Vec<String>,
}

/// Data source describing capabilities currently under active development
/// on another branch.
pub trait BranchRegistry: Send + Sync {
    fn get_in_progress(&self, component: &str) -> Vec<BranchEntry>;
    fn has_in_progress(&self, capability_keyword: &str) -> bool;
}
