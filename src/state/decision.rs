//! Decision, ReviewResult, HumanApproval, and BrainstormResult entities.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Approve,
    Revise,
    Reject,
    Pause,
}

/// A human review verdict on a task's draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub task_id: String,
    pub kind: DecisionKind,
    pub feedback: Option<String>,
}

/// An AI-review verdict (ai_review hook kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    pub hook_name: String,
    pub approved: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

/// A human_check gate verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanApproval {
    pub hook_name: String,
    pub approved: bool,
    pub feedback: Option<String>,
    pub timestamp: String,
}

/// Audit entry for one brainstorm task mutation decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainstormResult {
    pub hook_name: String,
    pub task_id: String,
    pub question: String,
    pub offered_options: Vec<String>,
    pub chosen_answer: String,
    pub action_taken: String,
    pub timestamp: String,
}
