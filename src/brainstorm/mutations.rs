//! Task mutations — defer / restore / split / terminate / drop.
//!
//! Every mutation runs against a clone of the state, checks every invariant
//! in `state::project_state`, and only commits on success — the state is
//! left untouched on refusal: validation errors leave state
//! unchanged").

use crate::error::{OrchestratorError, Result};
use crate::state::{ProjectState, Task, TaskScope, TaskStatus};

fn commit(state: &mut ProjectState, mutate: impl FnOnce(&mut ProjectState) -> Result<()>) -> Result<()> {
    let mut candidate = state.clone();
    mutate(&mut candidate)?;
    candidate.check_all_invariants()?;
    *state = candidate;
    Ok(())
}

/// Tasks in `state.tasks` (excluding ids already in `acc`) whose private
/// upstream deps (no consumer outside `acc`) should ride along with a defer.
fn collect_private_upstream(state: &ProjectState, frontier_id: &str, acc: &mut Vec<String>) {
    let deps = state
        .task(frontier_id)
        .map(|t| t.dependencies.clone())
        .unwrap_or_default();
    for dep in deps {
        if acc.contains(&dep) {
            continue;
        }
        let other_consumer = state
            .tasks
            .iter()
            .any(|t| !acc.contains(&t.id) && t.all_dependencies().iter().any(|d| d == &dep));
        if !other_consumer {
            acc.push(dep.clone());
            collect_private_upstream(state, &dep, acc);
        }
    }
}

/// Mark `id` (and any privately-upstream-only dependencies of it) `DEFERRED`,
/// recording `trigger`, and move `id` out of every downstream task's
/// `dependencies` into its `suspended_dependencies`.
pub fn defer(state: &mut ProjectState, id: &str, trigger: impl Into<String>) -> Result<()> {
    let trigger = trigger.into();
    if !state.has_task(id) {
        return Err(OrchestratorError::UnknownTask(id.to_string()));
    }
    commit(state, move |s| {
        let mut to_defer = vec![id.to_string()];
        collect_private_upstream(s, id, &mut to_defer);

        for tid in &to_defer {
            let snapshot = {
                let t = s.task(tid).expect("collected id exists");
                if t.original_dependencies.is_none() {
                    Some(t.all_dependencies())
                } else {
                    None
                }
            };
            let t = s.task_mut(tid).expect("collected id exists");
            if let Some(snap) = snapshot {
                t.original_dependencies = Some(snap);
            }
            t.status = TaskStatus::Deferred;
            t.defer_trigger = Some(trigger.clone());
        }

        for t in s.tasks.iter_mut() {
            if to_defer.contains(&t.id) {
                continue;
            }
            for tid in &to_defer {
                if let Some(pos) = t.dependencies.iter().position(|d| d == tid) {
                    t.dependencies.remove(pos);
                    t.suspended_dependencies.push(tid.clone());
                }
            }
        }
        Ok(())
    })
}

/// Revert a defer: `id` returns to `PENDING`, is re-inserted into every
/// downstream task's `dependencies`, and its `defer_trigger` is cleared.
pub fn restore(state: &mut ProjectState, id: &str) -> Result<()> {
    let status = state
        .task(id)
        .map(|t| t.status)
        .ok_or_else(|| OrchestratorError::UnknownTask(id.to_string()))?;
    if status != TaskStatus::Deferred {
        return Err(OrchestratorError::InvalidTaskStatus {
            task: id.to_string(),
            status: "restore requires a DEFERRED task".to_string(),
        });
    }
    commit(state, move |s| {
        for t in s.tasks.iter_mut() {
            if let Some(pos) = t.suspended_dependencies.iter().position(|d| d == id) {
                t.suspended_dependencies.remove(pos);
                t.dependencies.push(id.to_string());
            }
        }
        let t = s.task_mut(id).expect("checked above");
        t.status = TaskStatus::Pending;
        t.defer_trigger = None;
        Ok(())
    })
}

/// Minimal patch describing one half of a split.
#[derive(Debug, Clone)]
pub struct TaskSplitSpec {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Replace `id` with a `PENDING` safe part and a `DEFERRED` risky part that
/// depends on the safe part and inherits `id`'s downstream links.
pub fn split(
    state: &mut ProjectState,
    id: &str,
    safe_spec: TaskSplitSpec,
    risky_spec: TaskSplitSpec,
    trigger: impl Into<String>,
) -> Result<()> {
    let trigger = trigger.into();
    let original = state
        .task(id)
        .cloned()
        .ok_or_else(|| OrchestratorError::UnknownTask(id.to_string()))?;

    commit(state, move |s| {
        let safe_task = Task {
            id: safe_spec.id.clone(),
            title: safe_spec.title,
            description: safe_spec.description,
            layer: original.layer,
            kind: original.kind,
            scope: TaskScope::Small,
            specialist_tag: original.specialist_tag.clone(),
            status: TaskStatus::Pending,
            dependencies: original.dependencies.clone(),
            acceptance_criteria: original.acceptance_criteria.clone(),
            anticipated_files: original.anticipated_files.clone(),
            required_gates: original.required_gates.clone(),
            defer_trigger: None,
            original_dependencies: None,
            suspended_dependencies: Vec::new(),
            spec_doc_ref: original.spec_doc_ref.clone(),
            metadata: original.metadata.clone(),
        };
        let risky_task = Task {
            id: risky_spec.id.clone(),
            title: risky_spec.title,
            description: risky_spec.description,
            layer: original.layer,
            kind: original.kind,
            scope: original.scope,
            specialist_tag: original.specialist_tag.clone(),
            status: TaskStatus::Deferred,
            dependencies: vec![safe_spec.id.clone()],
            acceptance_criteria: original.acceptance_criteria.clone(),
            anticipated_files: Vec::new(),
            required_gates: original.required_gates.clone(),
            defer_trigger: Some(trigger),
            original_dependencies: None,
            suspended_dependencies: Vec::new(),
            spec_doc_ref: original.spec_doc_ref.clone(),
            metadata: original.metadata.clone(),
        };

        let index = s.tasks.iter().position(|t| t.id == id).expect("checked above");
        s.tasks.remove(index);
        s.tasks.insert(index, safe_task);
        s.tasks.insert(index + 1, risky_task);

        for t in s.tasks.iter_mut() {
            if t.id == safe_spec.id || t.id == risky_spec.id {
                continue;
            }
            if let Some(pos) = t.dependencies.iter().position(|d| d == id) {
                t.dependencies.remove(pos);
                t.dependencies.push(safe_spec.id.clone());
                t.suspended_dependencies.push(risky_spec.id.clone());
            }
        }
        Ok(())
    })
}

/// Mark `id` `TERMINATED`, flag its description, and strip it from every
/// downstream task's dependencies. The task itself remains for audit.
pub fn terminate(state: &mut ProjectState, id: &str) -> Result<()> {
    if !state.has_task(id) {
        return Err(OrchestratorError::UnknownTask(id.to_string()));
    }
    commit(state, move |s| {
        for t in s.tasks.iter_mut() {
            t.dependencies.retain(|d| d != id);
        }
        let t = s.task_mut(id).expect("checked above");
        t.status = TaskStatus::Terminated;
        t.description = format!("[TERMINATED] {}", t.description);
        Ok(())
    })
}

/// Remove `id` entirely and strip any dangling references to it.
pub fn drop_task(state: &mut ProjectState, id: &str) -> Result<()> {
    if !state.has_task(id) {
        return Err(OrchestratorError::UnknownTask(id.to_string()));
    }
    commit(state, move |s| {
        s.tasks.retain(|t| t.id != id);
        for t in s.tasks.iter_mut() {
            t.dependencies.retain(|d| d != id);
            t.suspended_dependencies.retain(|d| d != id);
            if let Some(orig) = t.original_dependencies.as_mut() {
                orig.retain(|d| d != id);
            }
        }
        if s.current_task_id.as_deref() == Some(id) {
            s.current_task_id = None;
        }
        Ok(())
    })
}
