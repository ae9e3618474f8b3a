//! `ai_review` hook kind — a configured set of named checks run
//! against the state; the hook's `approved` flag is `errors.is_empty()`.

use crate::backends::{BranchRegistry, CapabilityRegistry};
use crate::state::{ProjectState, ReviewResult, TaskKind, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiCheckKind {
    Completeness,
    BranchAwareness,
    DevelopableRespect,
    DependencyOrder,
    ScopeSanity,
    NoFrozenMutation,
}

impl AiCheckKind {
    pub fn name(self) -> &'static str {
        match self {
            AiCheckKind::Completeness => "completeness",
            AiCheckKind::BranchAwareness => "branch_awareness",
            AiCheckKind::DevelopableRespect => "developable_respect",
            AiCheckKind::DependencyOrder => "dependency_order",
            AiCheckKind::ScopeSanity => "scope_sanity",
            AiCheckKind::NoFrozenMutation => "no_frozen_mutation",
        }
    }
}

pub const ALL_AI_CHECKS: &[AiCheckKind] = &[
    AiCheckKind::Completeness,
    AiCheckKind::BranchAwareness,
    AiCheckKind::DevelopableRespect,
    AiCheckKind::DependencyOrder,
    AiCheckKind::ScopeSanity,
    AiCheckKind::NoFrozenMutation,
];

#[derive(Debug, Default)]
struct CheckOutcome {
    warnings: Vec<String>,
    errors: Vec<String>,
}

/// Every MISSING/EXTENSIBLE audit item should have produced a task that
/// references it via `specialist_tag`.
fn completeness(state: &ProjectState) -> CheckOutcome {
    let mut out = CheckOutcome::default();
    for item in &state.audit_items {
        use crate::state::AuditStatus::*;
        if matches!(item.status, Missing | Extensible)
            && !state.tasks.iter().any(|t| t.specialist_tag == item.component)
        {
            out.errors.push(format!(
                "audit item for \"{}\" ({:?}) was never decomposed into a task",
                item.component, item.status
            ));
        }
    }
    out
}

fn branch_awareness(state: &ProjectState, branch_registry: &dyn BranchRegistry) -> CheckOutcome {
    let mut out = CheckOutcome::default();
    for t in &state.tasks {
        if t.kind == TaskKind::New && branch_registry.has_in_progress(&t.specialist_tag) {
            out.errors.push(format!(
                "task {} targets \"{}\", which already has an in-progress branch",
                t.id, t.specialist_tag
            ));
        }
    }
    out
}

fn developable_respect(state: &ProjectState, capability_registry: &dyn CapabilityRegistry) -> CheckOutcome {
    let mut out = CheckOutcome::default();
    for t in &state.tasks {
        if t.kind == TaskKind::New && !capability_registry.is_developable(&t.specialist_tag) {
            out.errors.push(format!(
                "task {} is NEW-kind for non-developable component \"{}\"",
                t.id, t.specialist_tag
            ));
        }
    }
    out
}

fn dependency_order(state: &ProjectState) -> CheckOutcome {
    let mut out = CheckOutcome::default();
    if let Err(e) = state.check_acyclic() {
        out.errors.push(e.to_string());
    }
    for t in &state.tasks {
        if t.kind == TaskKind::Integration {
            continue;
        }
        for dep_id in &t.dependencies {
            if let Some(dep) = state.task(dep_id) {
                if dep.layer.rank() >= t.layer.rank() {
                    out.warnings.push(format!(
                        "task {} depends on {}, which is not in a strictly lower layer",
                        t.id, dep_id
                    ));
                }
            }
        }
    }
    out
}

fn scope_sanity(state: &ProjectState) -> CheckOutcome {
    use crate::state::TaskScope::*;
    let mut out = CheckOutcome::default();
    for t in &state.tasks {
        if matches!(t.scope, Large) && t.acceptance_criteria.is_empty() {
            out.warnings.push(format!(
                "task {} is LARGE scope with no acceptance criteria",
                t.id
            ));
        }
    }
    out
}

fn no_frozen_mutation(state: &ProjectState) -> CheckOutcome {
    let mut out = CheckOutcome::default();
    for t in &state.tasks {
        if t.status == TaskStatus::Done && t.defer_trigger.is_some() {
            out.errors.push(format!(
                "task {} is DONE but still carries a defer_trigger",
                t.id
            ));
        }
    }
    out
}

fn run_check(kind: AiCheckKind, state: &ProjectState, capability_registry: &dyn CapabilityRegistry, branch_registry: &dyn BranchRegistry) -> CheckOutcome {
    match kind {
        AiCheckKind::Completeness => completeness(state),
        AiCheckKind::BranchAwareness => branch_awareness(state, branch_registry),
        AiCheckKind::DevelopableRespect => developable_respect(state, capability_registry),
        AiCheckKind::DependencyOrder => dependency_order(state),
        AiCheckKind::ScopeSanity => scope_sanity(state),
        AiCheckKind::NoFrozenMutation => no_frozen_mutation(state),
    }
}

/// Run the configured checks and produce one `ReviewResult`.
pub fn run(
    state: &ProjectState,
    hook_name: &str,
    checks: &[AiCheckKind],
    capability_registry: &dyn CapabilityRegistry,
    branch_registry: &dyn BranchRegistry,
) -> ReviewResult {
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();
    for kind in checks {
        let outcome = run_check(*kind, state, capability_registry, branch_registry);
        issues.extend(outcome.errors);
        suggestions.extend(outcome.warnings);
    }
    ReviewResult {
        hook_name: hook_name.to_string(),
        approved: issues.is_empty(),
        issues,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::{EmptyBranchRegistry, InMemoryCapabilityRegistry};
    use crate::state::{AuditItem, AuditStatus, TaskBuilder};

    #[test]
    fn completeness_flags_undecomposed_audit_item() {
        let mut state = ProjectState::new("demo");
        state.audit_items.push(AuditItem {
            component: "billing".to_string(),
            status: AuditStatus::Missing,
            description: "no billing".to_string(),
            details: Default::default(),
        });
        let registry = InMemoryCapabilityRegistry::new();
        let branches = EmptyBranchRegistry;
        let review = run(&state, "after_decompose", &[AiCheckKind::Completeness], &registry, &branches);
        assert!(!review.approved);
    }

    #[test]
    fn no_frozen_mutation_flags_done_task_with_trigger() {
        let mut state = ProjectState::new("demo");
        let mut t = TaskBuilder::new("T-1", "demo").build();
        t.status = TaskStatus::Done;
        t.defer_trigger = Some("T-2:completed".to_string());
        state.tasks.push(t);
        let registry = InMemoryCapabilityRegistry::new();
        let branches = EmptyBranchRegistry;
        let review = run(&state, "after_task_complete", &[AiCheckKind::NoFrozenMutation], &registry, &branches);
        assert!(!review.approved);
    }

    #[test]
    fn clean_state_is_approved() {
        let state = ProjectState::new("demo");
        let registry = InMemoryCapabilityRegistry::new();
        let branches = EmptyBranchRegistry;
        let review = run(&state, "after_audit", ALL_AI_CHECKS, &registry, &branches);
        assert!(review.approved);
    }
}
