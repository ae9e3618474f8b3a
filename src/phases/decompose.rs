//! `decompose` phase — turn audit findings into an ordered,
//! dependency-wired task graph, plus one synthesized integration task.

use crate::backends::CapabilityRegistry;
use crate::error::{OrchestratorError, Result};
use crate::state::{
    AuditItem, AuditStatus, GateKind, Phase, ProjectState, TaskBuilder, TaskKind, TaskLayer,
    TaskScope,
};

/// Classify a component name into a task layer by cross-referencing the same
/// curated vocabularies `phases::intake` uses to extract it in the first
/// place.
fn infer_layer(component: &str) -> TaskLayer {
    const ALGORITHM_ISH: &[&str] = &[
        "embedding", "vector", "regex", "parser", "compiler", "hashing",
        "encryption", "sharding", "replication",
    ];
    const WORKFLOW_ISH: &[&str] = &["scheduler", "queue", "worker", "cron", "workflow", "pipeline"];

    if ALGORITHM_ISH.contains(&component) {
        TaskLayer::Algorithm
    } else if WORKFLOW_ISH.contains(&component) {
        TaskLayer::Workflow
    } else if crate::vocab::METHOD_VOCAB.contains(&component) {
        TaskLayer::Infra
    } else {
        TaskLayer::Core
    }
}

fn gates_for_layer(layer: TaskLayer) -> Vec<GateKind> {
    match layer {
        TaskLayer::Core => vec![
            GateKind::Build,
            GateKind::Unit,
            GateKind::Lint,
            GateKind::Contract,
        ],
        TaskLayer::Infra | TaskLayer::Algorithm | TaskLayer::Workflow => {
            vec![GateKind::Unit, GateKind::Lint]
        }
        TaskLayer::Validation => vec![GateKind::Unit, GateKind::Numeric],
    }
}

struct Draft1Task {
    title: String,
    description: String,
    layer: TaskLayer,
    kind: TaskKind,
    specialist_tag: String,
    matched_term: String,
}

fn drafts_from_items(
    items: &[AuditItem],
    capability_registry: &dyn CapabilityRegistry,
) -> Vec<Draft1Task> {
    let mut out = Vec::new();
    for item in items {
        let matched_term = item
            .matched_term()
            .map(str::to_string)
            .unwrap_or_else(|| item.component.clone());
        match item.status {
            AuditStatus::InProgress => continue,
            AuditStatus::Available => continue,
            AuditStatus::Extensible => out.push(Draft1Task {
                title: format!("Extend {} to cover {}", item.component, matched_term),
                description: item.description.clone(),
                layer: infer_layer(&item.component),
                kind: TaskKind::Extend,
                specialist_tag: item.component.clone(),
                matched_term,
            }),
            AuditStatus::Missing => {
                if capability_registry.is_developable(&item.component) {
                    out.push(Draft1Task {
                        title: format!("Build {}", item.component),
                        description: item.description.clone(),
                        layer: infer_layer(&item.component),
                        kind: TaskKind::New,
                        specialist_tag: item.component.clone(),
                        matched_term,
                    })
                } else {
                    out.push(Draft1Task {
                        title: format!("Integrate external dependency for {}", item.component),
                        description: item.description.clone(),
                        layer: TaskLayer::Infra,
                        kind: TaskKind::ExternalDependency,
                        specialist_tag: item.component.clone(),
                        matched_term,
                    })
                }
            }
        }
    }
    out
}

/// Run the decompose phase and advance to `Execute`.
pub fn run(
    mut state: ProjectState,
    capability_registry: &dyn CapabilityRegistry,
) -> Result<ProjectState> {
    if state.phase != Phase::Decompose {
        return Err(OrchestratorError::PhasePrecondition {
            expected: "decompose".to_string(),
            actual: state.phase.as_str().to_string(),
        });
    }

    let mut drafts = drafts_from_items(&state.audit_items, capability_registry);
    drafts.sort_by_key(|d| d.layer.rank());

    let prefix = "TASK";
    let mut tasks = Vec::new();
    for (idx, draft) in drafts.into_iter().enumerate() {
        let id = format!("{prefix}-{:03}", idx + 1);
        // Every task created so far is on a rank strictly lower than, or
        // equal to, this one; dependency wiring only looks at strictly
        // lower layers so siblings in the same layer stay independent.
        let dependencies: Vec<String> = tasks
            .iter()
            .filter(|t: &&crate::state::Task| t.layer.rank() < draft.layer.rank())
            .map(|t| t.id.clone())
            .collect();

        let task = TaskBuilder::new(&id, draft.title)
            .description(draft.description)
            .layer(draft.layer)
            .kind(draft.kind)
            .scope(TaskScope::Medium)
            .specialist_tag(draft.specialist_tag)
            .dependencies(dependencies)
            .acceptance_criteria(vec![format!("covers {}", draft.matched_term)])
            .required_gates(gates_for_layer(draft.layer))
            .build();
        tasks.push(task);
    }

    if !tasks.is_empty() {
        let integration_id = format!("{prefix}-{:03}", tasks.len() + 1);
        let all_ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        let integration_task = TaskBuilder::new(&integration_id, "Integrate all tasks")
            .description("Synthesized cross-task integration test".to_string())
            .layer(TaskLayer::Validation)
            .kind(TaskKind::Integration)
            .scope(TaskScope::Large)
            .specialist_tag("integration".to_string())
            .dependencies(all_ids)
            .acceptance_criteria(vec!["all dependent tasks integrate cleanly".to_string()])
            .required_gates(gates_for_layer(TaskLayer::Validation))
            .build();
        tasks.push(integration_task);
    }

    state.record_event("decompose", format!("created {} task(s)", tasks.len()));
    state.tasks = tasks;
    // A decompose producing zero tasks (every term already AVAILABLE or
    // IN_PROGRESS) has nothing to execute or verify; go straight to
    // integration bookkeeping.
    state.phase = if state.tasks.is_empty() {
        Phase::Integrate
    } else {
        Phase::Execute
    };
    state.check_all_invariants()?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::InMemoryCapabilityRegistry;
    use crate::state::TaskStatus;

    fn audited(items: Vec<AuditItem>) -> ProjectState {
        let mut state = ProjectState::new("demo");
        state.phase = Phase::Decompose;
        state.audit_items = items;
        state
    }

    fn missing(component: &str) -> AuditItem {
        AuditItem {
            component: component.to_string(),
            status: AuditStatus::Missing,
            description: format!("no capability for {component}"),
            details: [("matched_term".to_string(), component.to_string())].into(),
        }
    }

    #[test]
    fn missing_items_become_new_tasks_with_integration_appended() {
        let state = audited(vec![missing("billing"), missing("scheduler")]);
        let registry = InMemoryCapabilityRegistry::new();
        let state = run(state, &registry).unwrap();
        assert_eq!(state.phase, Phase::Execute);
        assert_eq!(state.tasks.len(), 3);
        let integration = state.tasks.last().unwrap();
        assert_eq!(integration.kind, TaskKind::Integration);
        assert_eq!(integration.dependencies.len(), 2);
    }

    #[test]
    fn non_developable_missing_becomes_external_dependency() {
        let state = audited(vec![missing("payment-gateway")]);
        let registry =
            InMemoryCapabilityRegistry::new().with_non_developable("payment-gateway");
        let state = run(state, &registry).unwrap();
        assert_eq!(state.tasks[0].kind, TaskKind::ExternalDependency);
    }

    #[test]
    fn available_and_in_progress_items_are_skipped() {
        let mut available = missing("billing");
        available.status = AuditStatus::Available;
        let mut in_progress = missing("search");
        in_progress.status = AuditStatus::InProgress;
        let state = audited(vec![available, in_progress]);
        let registry = InMemoryCapabilityRegistry::new();
        let state = run(state, &registry).unwrap();
        assert!(state.tasks.is_empty());
        assert_eq!(state.phase, Phase::Integrate);
    }

    #[test]
    fn dependencies_only_reference_strictly_lower_layers() {
        let state = audited(vec![missing("billing"), missing("auth")]);
        let registry = InMemoryCapabilityRegistry::new();
        let state = run(state, &registry).unwrap();
        for t in &state.tasks {
            if t.kind == TaskKind::Integration {
                continue;
            }
            for dep_id in &t.dependencies {
                let dep = state.task(dep_id).unwrap();
                assert!(dep.layer.rank() < t.layer.rank());
            }
        }
    }

    #[test]
    fn all_created_tasks_start_pending() {
        let state = audited(vec![missing("billing")]);
        let registry = InMemoryCapabilityRegistry::new();
        let state = run(state, &registry).unwrap();
        assert!(state.tasks.iter().all(|t| t.status == TaskStatus::Pending));
    }
}
