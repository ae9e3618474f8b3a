//! `regenerate` hook kind — fires downstream side effects
//! (dashboard / dependency-graph regeneration). Never blocks.

use crate::state::ProjectState;

/// Always succeeds; logs and leaves a diagnostic trail, never sets
/// `blocked_reason`.
pub fn run(state: &mut ProjectState, hook_name: &str) {
    tracing::info!(hook = hook_name, tasks = state.tasks.len(), "regenerate hook fired");
    state.record_event("regenerate", format!("{hook_name} regeneration side-effects dispatched"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regenerate_never_blocks() {
        let mut state = ProjectState::new("demo");
        run(&mut state, "after_decompose");
        assert!(state.blocked_reason.is_none());
        assert_eq!(state.history.len(), 1);
    }
}
