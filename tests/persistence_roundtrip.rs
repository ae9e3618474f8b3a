//! Round-trip and invariant-preservation checks that span modules — the
//! kind of law a unit test inside a single file can't see end to end.

use taskpilot::brainstorm::mutations;
use taskpilot::persistence;
use taskpilot::state::{GateKind, ProjectState, TaskBuilder, TaskStatus};

fn sample_state() -> ProjectState {
    let mut state = ProjectState::new("build a thing");
    state.tasks.push(
        TaskBuilder::new("TASK-001", "core work")
            .required_gates(vec![GateKind::Build, GateKind::Unit])
            .build(),
    );
    state.tasks.push(
        TaskBuilder::new("TASK-002", "downstream work")
            .dependencies(vec!["TASK-001".to_string()])
            .build(),
    );
    state
}

#[test]
fn saved_state_reloads_to_an_equal_task_graph() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let state = sample_state();

    persistence::save(&state, &path).unwrap();
    let reloaded = persistence::load(&path).unwrap();

    assert_eq!(reloaded.tasks.len(), state.tasks.len());
    for (a, b) in state.tasks.iter().zip(reloaded.tasks.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.dependencies, b.dependencies);
        assert_eq!(a.required_gates, b.required_gates);
    }
    reloaded.check_all_invariants().unwrap();
}

#[test]
fn defer_then_restore_leaves_dependency_wiring_unchanged() {
    let before = sample_state();
    let original_dependencies = before.task("TASK-002").unwrap().dependencies.clone();

    let mut state = before.clone();
    mutations::defer(&mut state, "TASK-002", "TASK-001:completed").unwrap();
    assert_eq!(state.task("TASK-002").unwrap().status, TaskStatus::Deferred);

    mutations::restore(&mut state, "TASK-002").unwrap();
    let restored_task = state.task("TASK-002").unwrap();

    assert_eq!(restored_task.status, TaskStatus::Pending);
    assert_eq!(restored_task.dependencies, original_dependencies);
    state.check_all_invariants().unwrap();
}

#[test]
fn refused_mutation_leaves_state_byte_identical() {
    let mut state = sample_state();
    let before_json = serde_json::to_string(&state).unwrap();

    let result = mutations::defer(&mut state, "TASK-999", "never");
    assert!(result.is_err());

    let after_json = serde_json::to_string(&state).unwrap();
    assert_eq!(before_json, after_json);
}
