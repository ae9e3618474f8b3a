//! The typed state model: tasks, drafts, gate results, decisions, and
//! the root `ProjectState` aggregate, with serialization and lifecycle
//! invariants.

pub mod audit;
pub mod decision;
pub mod draft;
pub mod gate;
pub mod integration;
pub mod project_state;
pub mod task;

pub use audit::{AuditItem, AuditStatus};
pub use decision::{BrainstormResult, Decision, DecisionKind, HumanApproval, ReviewResult};
pub use draft::Draft;
pub use gate::{gate_key, split_gate_key, GateResult, GateStatus};
pub use integration::{IntegrationResult, IntegrationTest};
pub use project_state::{Phase, ProjectState, StateEvent};
pub use task::{GateKind, Task, TaskBuilder, TaskKind, TaskLayer, TaskScope, TaskStatus};
