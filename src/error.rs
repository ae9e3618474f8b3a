//! Crate-wide error types.
//!
//! Validation errors (invariant violations, unknown task ids, cycle
//! creation) are raised locally as [`OrchestratorError`] and refuse the
//! operation, leaving state unchanged. Backend/hook failures are instead
//! surfaced through `ProjectState::blocked_reason` — see `state::project_state`.

use thiserror::Error;

/// Errors raised by core operations (scheduler, phases, brainstorm
/// mutations, orchestrator) when an invariant would be violated.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("unknown task id: {0}")]
    UnknownTask(String),

    #[error("task id already exists: {0}")]
    DuplicateTask(String),

    #[error("mutation would introduce a dependency cycle involving task {0}")]
    CycleDetected(String),

    #[error("invalid defer_trigger on task {task}: {reason}")]
    InvalidTrigger { task: String, reason: String },

    #[error("phase precondition failed: expected {expected}, found {actual}")]
    PhasePrecondition { expected: String, actual: String },

    #[error("operation not valid in current task status: task {task} is {status}")]
    InvalidTaskStatus { task: String, status: String },

    #[error("hook retry budget exhausted for hook {hook} after {attempts} attempts")]
    HookRetryExhausted { hook: String, attempts: u32 },

    #[error("invariant violated for task {task}: {detail}")]
    InvariantViolation { task: String, detail: String },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
