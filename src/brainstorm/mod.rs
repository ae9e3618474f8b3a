//! Brainstorm subsystem (C4): risk detection, task mutation, trigger-based
//! promotion.

pub mod checks;
pub mod engine;
pub mod mutations;

pub use checks::{CheckKind, RiskConfig, ALL_CHECKS};
pub use engine::{BrainstormAction, BrainstormMode, BrainstormStatus};
