//! Draft entity — specialist output for a single task.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Draft {
    pub task_id: String,
    /// Path -> file content.
    pub files: HashMap<String, String>,
    /// Test file path -> test content.
    pub tests: HashMap<String, String>,
    pub explanation: String,
}

impl Draft {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            files: HashMap::new(),
            tests: HashMap::new(),
            explanation: String::new(),
        }
    }

    /// A draft must populate at least one file entry or an explanation.
    pub fn is_well_formed(&self) -> bool {
        !self.files.is_empty() || !self.explanation.is_empty()
    }
}
