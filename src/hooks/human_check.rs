//! `human_check` hook kind — prompts for a decision in
//! `interactive` or `file` mode, same two-call semantics as brainstorm file
//! mode, interactive or file-mediated.

use crate::error::{OrchestratorError, Result};
use crate::state::HumanApproval;
use crate::state::ProjectState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanCheckStatus {
    Approved,
    Rejected,
    Paused,
    Unresolved,
}

pub enum HumanCheckMode {
    Interactive,
    FilePrompt { path: PathBuf },
    FileResponse { path: PathBuf },
}

/// What an interactive decider returns: approve, reject, or pause, each with
/// optional feedback text.
pub enum HumanDecision {
    Approve,
    Reject(Option<String>),
    Pause(Option<String>),
}

#[derive(Debug, Serialize)]
struct PromptFile {
    hook_name: String,
    questions: Vec<PromptQuestion>,
}

#[derive(Debug, Serialize)]
struct PromptQuestion {
    question: String,
    options: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseFile {
    #[allow(dead_code)]
    hook_name: String,
    responses: Vec<ResponseEntry>,
}

#[derive(Debug, Deserialize)]
struct ResponseEntry {
    answer: String,
    feedback: Option<String>,
}

fn record_and_status(state: &mut ProjectState, hook_name: &str, decision: HumanDecision) -> HumanCheckStatus {
    let (approved, feedback, status) = match decision {
        HumanDecision::Approve => (true, None, HumanCheckStatus::Approved),
        HumanDecision::Reject(fb) => (false, fb, HumanCheckStatus::Rejected),
        HumanDecision::Pause(fb) => (false, fb, HumanCheckStatus::Paused),
    };
    state.human_approvals.push(HumanApproval {
        hook_name: hook_name.to_string(),
        approved,
        feedback: feedback.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    });
    if !approved {
        state.blocked_reason =
            Some(feedback.unwrap_or_else(|| format!("human_check {hook_name} not approved")));
    }
    status
}

pub fn run_human_check(
    state: &mut ProjectState,
    hook_name: &str,
    mode: HumanCheckMode,
    mut decider: Option<&mut dyn FnMut() -> HumanDecision>,
) -> Result<HumanCheckStatus> {
    match mode {
        HumanCheckMode::Interactive => {
            let decider = decider
                .as_mut()
                .ok_or_else(|| OrchestratorError::Backend("interactive mode requires a decider".to_string()))?;
            let decision = decider();
            Ok(record_and_status(state, hook_name, decision))
        }
        HumanCheckMode::FilePrompt { path } => {
            let prompt = PromptFile {
                hook_name: hook_name.to_string(),
                questions: vec![PromptQuestion {
                    question: format!("Approve hook \"{hook_name}\"?"),
                    options: vec!["approve".into(), "reject".into(), "pause".into()],
                }],
            };
            let body = serde_yaml::to_string(&prompt)
                .map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
            std::fs::write(&path, body).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
            Ok(HumanCheckStatus::Unresolved)
        }
        HumanCheckMode::FileResponse { path } => {
            if !Path::new(&path).exists() {
                return Ok(HumanCheckStatus::Unresolved);
            }
            let body = std::fs::read_to_string(&path).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
            let response: ResponseFile =
                serde_yaml::from_str(&body).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
            let Some(entry) = response.responses.into_iter().next() else {
                return Ok(HumanCheckStatus::Unresolved);
            };
            let decision = match entry.answer.as_str() {
                "approve" => HumanDecision::Approve,
                "reject" => HumanDecision::Reject(entry.feedback),
                _ => HumanDecision::Pause(entry.feedback),
            };
            Ok(record_and_status(state, hook_name, decision))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn interactive_approve_records_approval() {
        let mut state = ProjectState::new("demo");
        let mut decider = || HumanDecision::Approve;
        let status = run_human_check(&mut state, "after_audit", HumanCheckMode::Interactive, Some(&mut decider)).unwrap();
        assert_eq!(status, HumanCheckStatus::Approved);
        assert!(state.blocked_reason.is_none());
        assert_eq!(state.human_approvals.len(), 1);
    }

    #[test]
    fn interactive_pause_sets_blocked_reason() {
        let mut state = ProjectState::new("demo");
        let mut decider = || HumanDecision::Pause(Some("need more context".to_string()));
        let status = run_human_check(&mut state, "after_audit", HumanCheckMode::Interactive, Some(&mut decider)).unwrap();
        assert_eq!(status, HumanCheckStatus::Paused);
        assert_eq!(state.blocked_reason.as_deref(), Some("need more context"));
    }

    #[test]
    fn file_mode_round_trip() {
        let dir = tempdir().unwrap();
        let prompt_path = dir.path().join("prompt.yaml");
        let response_path = dir.path().join("response.yaml");
        let mut state = ProjectState::new("demo");

        let status = run_human_check(
            &mut state,
            "after_audit",
            HumanCheckMode::FilePrompt { path: prompt_path.clone() },
            None,
        )
        .unwrap();
        assert_eq!(status, HumanCheckStatus::Unresolved);
        assert!(prompt_path.exists());

        let status = run_human_check(
            &mut state,
            "after_audit",
            HumanCheckMode::FileResponse { path: response_path.clone() },
            None,
        )
        .unwrap();
        assert_eq!(status, HumanCheckStatus::Unresolved);

        std::fs::write(
            &response_path,
            "hook_name: after_audit\nresponses:\n  - answer: approve\n",
        )
        .unwrap();

        let status = run_human_check(
            &mut state,
            "after_audit",
            HumanCheckMode::FileResponse { path: response_path },
            None,
        )
        .unwrap();
        assert_eq!(status, HumanCheckStatus::Approved);
    }
}
