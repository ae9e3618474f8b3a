//! IntegrationResult entity — outcome of a cross-task integration test.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationResult {
    pub test_name: String,
    pub passed: bool,
    pub output: String,
    pub covered_task_ids: Vec<String>,
}

/// A synthesized cross-task integration test, assembled by the orchestrator
/// once every task is `Done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationTest {
    pub name: String,
    pub covered_task_ids: Vec<String>,
    pub description: String,
}
