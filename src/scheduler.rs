//! Scheduler — "which task runs next?" and "which deferred tasks must
//! be promoted now?"

use crate::state::{ProjectState, TaskStatus};

/// Return the first task (in task-list insertion order) whose status is
/// `Pending` and all of whose current `dependencies` are `Done`.
///
/// Deterministic given the state (testable property 6): never returns a
/// task whose status is `Deferred`, `InProgress`, `InReview`, `Done`,
/// `Failed`, or `Terminated` (enforced simply by requiring `Pending`).
pub fn select_next_task(state: &ProjectState) -> Option<&crate::state::Task> {
    state.tasks.iter().find(|t| {
        t.status == TaskStatus::Pending
            && t.dependencies
                .iter()
                .all(|dep| state.task(dep).map(|d| d.status) == Some(TaskStatus::Done))
    })
}

/// Parse a `defer_trigger` string of the form `"TASK:condition"`.
fn parse_trigger(trigger: &str) -> Option<(&str, &str)> {
    trigger.split_once(':')
}

/// Does `cond` match per the completion of `completed_task_id`?
///
/// `cond` matches if it is one of the well-known tokens `completed` /
/// `promoted`, or if it is found as a substring of any stored gate output
/// keyed `"<completed_task_id>:*"`. Matching is a case-sensitive substring
/// match on the condition tag against the gate result's raw output.
fn condition_matches(state: &ProjectState, completed_task_id: &str, cond: &str) -> bool {
    if cond == "completed" || cond == "promoted" {
        return true;
    }
    state
        .gate_results
        .iter()
        .any(|(key, result)| match crate::state::split_gate_key(key) {
            Some((task_id, _gate_kind)) if task_id == completed_task_id => {
                result.raw_output.contains(cond)
            }
            _ => false,
        })
}

/// Promote a single deferred task: status -> `Pending`, restore its
/// suspended dependencies into `dependencies`, and clear `defer_trigger`.
fn promote(state: &mut ProjectState, task_id: &str) {
    if let Some(task) = state.task_mut(task_id) {
        task.status = TaskStatus::Pending;
        let restored = std::mem::take(&mut task.suspended_dependencies);
        for dep in restored {
            if !task.dependencies.contains(&dep) {
                task.dependencies.push(dep);
            }
        }
        task.defer_trigger = None;
    }
    state.record_event("promote", task_id);
}

/// Scan all `Deferred` tasks and promote every one whose trigger fires for
/// `completed_task_id`. Promotion is recursive: a promoted task's own
/// suspended dependents (if any were themselves deferred independently) are
/// re-evaluated in the same pass, since promoting T may satisfy another
/// task's `"T:completed"` trigger indirectly through further completions —
/// here we only need one pass per call because a task can only ever be
/// promoted by the literal task id named in its own trigger.
///
/// Returns the ids of tasks that were promoted, in task-list order.
pub fn check_deferred_triggers(state: &mut ProjectState, completed_task_id: &str) -> Vec<String> {
    let mut to_promote = Vec::new();
    for t in &state.tasks {
        if t.status != TaskStatus::Deferred {
            continue;
        }
        let Some(trigger) = &t.defer_trigger else {
            continue;
        };
        let Some((target, cond)) = parse_trigger(trigger) else {
            continue;
        };
        if target != completed_task_id {
            continue;
        }
        if condition_matches(state, completed_task_id, cond) {
            to_promote.push(t.id.clone());
        }
    }

    for id in &to_promote {
        promote(state, id);
    }

    to_promote
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::gate::gate_key;
    use crate::state::{GateKind, GateResult, GateStatus, TaskBuilder};

    fn done(mut t: crate::state::Task) -> crate::state::Task {
        t.status = TaskStatus::Done;
        t
    }

    #[test]
    fn select_next_task_empty_returns_none() {
        let s = ProjectState::new("demo");
        assert!(select_next_task(&s).is_none());
    }

    #[test]
    fn select_next_task_returns_pending_with_done_deps() {
        let mut s = ProjectState::new("demo");
        s.tasks.push(done(TaskBuilder::new("T-1", "t1").build()));
        s.tasks.push(
            TaskBuilder::new("T-2", "t2")
                .dependencies(vec!["T-1".to_string()])
                .build(),
        );
        let next = select_next_task(&s).unwrap();
        assert_eq!(next.id, "T-2");
    }

    #[test]
    fn select_next_task_skips_when_dependency_not_done() {
        let mut s = ProjectState::new("demo");
        s.tasks.push(TaskBuilder::new("T-1", "t1").build());
        s.tasks.push(
            TaskBuilder::new("T-2", "t2")
                .dependencies(vec!["T-1".to_string()])
                .build(),
        );
        let next = select_next_task(&s).unwrap();
        assert_eq!(next.id, "T-1");
    }

    #[test]
    fn select_next_task_never_returns_deferred() {
        let mut s = ProjectState::new("demo");
        let mut t = TaskBuilder::new("T-1", "t1").build();
        t.status = TaskStatus::Deferred;
        t.defer_trigger = Some("T-2:completed".to_string());
        s.tasks.push(t);
        assert!(select_next_task(&s).is_none());
    }

    #[test]
    fn trigger_promotion_on_completed_token() {
        let mut s = ProjectState::new("demo");
        let mut t1 = TaskBuilder::new("T-1", "t1").build();
        t1.status = TaskStatus::Deferred;
        t1.defer_trigger = Some("T-3:completed".to_string());
        s.tasks.push(t1);
        s.tasks.push(done(TaskBuilder::new("T-3", "t3").build()));

        let promoted = check_deferred_triggers(&mut s, "T-3");
        assert_eq!(promoted, vec!["T-1".to_string()]);
        assert_eq!(s.task("T-1").unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn trigger_promotion_restores_suspended_dependencies() {
        let mut s = ProjectState::new("demo");
        let mut t1 = TaskBuilder::new("T-1", "t1").build();
        t1.status = TaskStatus::Deferred;
        t1.defer_trigger = Some("T-3:completed".to_string());
        t1.suspended_dependencies = vec!["T-0".to_string()];
        s.tasks.push(t1);
        s.tasks.push(done(TaskBuilder::new("T-0", "t0").build()));
        s.tasks.push(done(TaskBuilder::new("T-3", "t3").build()));

        check_deferred_triggers(&mut s, "T-3");
        let t1 = s.task("T-1").unwrap();
        assert_eq!(t1.dependencies, vec!["T-0".to_string()]);
        assert!(t1.suspended_dependencies.is_empty());
    }

    #[test]
    fn trigger_promotion_on_gate_failure_substring() {
        let mut s = ProjectState::new("demo");
        let mut t1 = TaskBuilder::new("T-1", "t1").build();
        t1.status = TaskStatus::Deferred;
        t1.defer_trigger = Some("T-2:accuracy_below_threshold".to_string());
        s.tasks.push(t1);
        s.tasks.push(done(TaskBuilder::new("T-2", "t2").build()));
        s.gate_results.insert(
            gate_key("T-2", GateKind::Numeric),
            GateResult {
                task_id: "T-2".to_string(),
                gate_kind: GateKind::Numeric,
                status: GateStatus::Fail,
                raw_output: "numeric gate failed: accuracy_below_threshold (0.42 < 0.8)"
                    .to_string(),
            },
        );

        let promoted = check_deferred_triggers(&mut s, "T-2");
        assert_eq!(promoted, vec!["T-1".to_string()]);
    }

    #[test]
    fn trigger_not_promoted_for_unrelated_task() {
        let mut s = ProjectState::new("demo");
        let mut t1 = TaskBuilder::new("T-1", "t1").build();
        t1.status = TaskStatus::Deferred;
        t1.defer_trigger = Some("T-9:completed".to_string());
        s.tasks.push(t1);
        s.tasks.push(done(TaskBuilder::new("T-3", "t3").build()));

        let promoted = check_deferred_triggers(&mut s, "T-3");
        assert!(promoted.is_empty());
        assert_eq!(s.task("T-1").unwrap().status, TaskStatus::Deferred);
    }
}
