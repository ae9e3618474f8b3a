//! `run_brainstorm` — flags risky tasks with the configured
//! checks and resolves each one through auto, interactive, or file-mediated
//! decisions.

use crate::brainstorm::checks::{first_risk, CheckKind, RiskConfig};
use crate::brainstorm::mutations;
use crate::error::{OrchestratorError, Result};
use crate::state::{BrainstormResult, ProjectState, Task};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const OFFERED_OPTIONS: &[&str] = &["defer", "terminate", "drop", "keep"];

#[derive(Debug, Clone)]
pub enum BrainstormAction {
    Defer { trigger: String },
    Terminate,
    Drop,
    Keep,
}

impl BrainstormAction {
    fn as_answer(&self) -> &'static str {
        match self {
            BrainstormAction::Defer { .. } => "defer",
            BrainstormAction::Terminate => "terminate",
            BrainstormAction::Drop => "drop",
            BrainstormAction::Keep => "keep",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainstormStatus {
    Resolved,
    Unresolved,
}

pub enum BrainstormMode {
    /// Apply a default action (defer) to every flagged task.
    Auto,
    /// Obtain a decision synchronously, once per flagged task.
    Interactive,
    /// First pass: write a prompt file and return `Unresolved`.
    FilePrompt { path: PathBuf },
    /// Second pass: read a response file and apply decisions, or stay
    /// `Unresolved` if the file isn't there yet.
    FileResponse { path: PathBuf },
}

#[derive(Debug, Serialize)]
struct PromptFile {
    hook_name: String,
    questions: Vec<PromptQuestion>,
}

#[derive(Debug, Serialize)]
struct PromptQuestion {
    task_id: String,
    question: String,
    options: Vec<String>,
    risk_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseFile {
    #[allow(dead_code)]
    hook_name: String,
    responses: Vec<ResponseEntry>,
}

#[derive(Debug, Deserialize)]
struct ResponseEntry {
    task_id: String,
    answer: String,
    /// Extra field, beyond the minimal answer/feedback shape, that lets a
    /// human's response carry a defer trigger string back in one round trip.
    trigger: Option<String>,
    #[allow(dead_code)]
    feedback: Option<String>,
}

fn question_text(check: CheckKind, reason: &str) -> String {
    format!("risk check \"{}\" flagged this task: {reason}. What should happen?", check.name())
}

fn default_trigger(task_id: &str) -> String {
    format!("{task_id}:manual_review")
}

fn action_description(action: &BrainstormAction) -> String {
    match action {
        BrainstormAction::Defer { trigger } => format!("deferred with trigger \"{trigger}\""),
        BrainstormAction::Terminate => "terminated".to_string(),
        BrainstormAction::Drop => "dropped".to_string(),
        BrainstormAction::Keep => "kept, no mutation applied".to_string(),
    }
}

fn apply_action(state: &mut ProjectState, task_id: &str, action: &BrainstormAction) -> Result<()> {
    match action {
        BrainstormAction::Defer { trigger } => mutations::defer(state, task_id, trigger.clone()),
        BrainstormAction::Terminate => mutations::terminate(state, task_id),
        BrainstormAction::Drop => mutations::drop_task(state, task_id),
        BrainstormAction::Keep => Ok(()),
    }
}

fn record(
    state: &mut ProjectState,
    hook_name: &str,
    task_id: &str,
    question: String,
    chosen_answer: &str,
    action: &BrainstormAction,
) {
    state.brainstorm_results.push(BrainstormResult {
        hook_name: hook_name.to_string(),
        task_id: task_id.to_string(),
        question,
        offered_options: OFFERED_OPTIONS.iter().map(|s| s.to_string()).collect(),
        chosen_answer: chosen_answer.to_string(),
        action_taken: action_description(action),
        timestamp: chrono::Utc::now().to_rfc3339(),
    });
}

fn flagged_tasks(state: &ProjectState, checks: &[CheckKind], cfg: &RiskConfig) -> Vec<(Task, CheckKind, String)> {
    state
        .tasks
        .iter()
        .filter_map(|t| first_risk(checks, t, &state.tasks, cfg).map(|(check, reason)| (t.clone(), check, reason)))
        .collect()
}

/// Run the brainstorm subsystem once. `decider` is consulted only in
/// `Interactive` mode.
pub fn run_brainstorm(
    state: &mut ProjectState,
    hook_name: &str,
    checks: &[CheckKind],
    cfg: &RiskConfig,
    mode: BrainstormMode,
    mut decider: Option<&mut dyn FnMut(&Task, CheckKind, &str) -> BrainstormAction>,
) -> Result<BrainstormStatus> {
    let flagged = flagged_tasks(state, checks, cfg);
    if flagged.is_empty() {
        return Ok(BrainstormStatus::Resolved);
    }

    match mode {
        BrainstormMode::Auto => {
            for (task, check, reason) in &flagged {
                let action = BrainstormAction::Defer {
                    trigger: default_trigger(&task.id),
                };
                apply_action(state, &task.id, &action)?;
                let question = question_text(*check, reason);
                let answer = action.as_answer().to_string();
                record(state, hook_name, &task.id, question, &answer, &action);
            }
            Ok(BrainstormStatus::Resolved)
        }
        BrainstormMode::Interactive => {
            let decider = decider
                .as_mut()
                .ok_or_else(|| OrchestratorError::Backend("interactive mode requires a decider".to_string()))?;
            for (task, check, reason) in &flagged {
                let action = decider(task, *check, reason);
                apply_action(state, &task.id, &action)?;
                let question = question_text(*check, reason);
                let answer = action.as_answer().to_string();
                record(state, hook_name, &task.id, question, &answer, &action);
            }
            Ok(BrainstormStatus::Resolved)
        }
        BrainstormMode::FilePrompt { path } => {
            let prompt = PromptFile {
                hook_name: hook_name.to_string(),
                questions: flagged
                    .iter()
                    .map(|(task, check, reason)| PromptQuestion {
                        task_id: task.id.clone(),
                        question: question_text(*check, reason),
                        options: OFFERED_OPTIONS.iter().map(|s| s.to_string()).collect(),
                        risk_reason: Some(reason.clone()),
                    })
                    .collect(),
            };
            let body = serde_yaml::to_string(&prompt)
                .map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
            std::fs::write(&path, body).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
            Ok(BrainstormStatus::Unresolved)
        }
        BrainstormMode::FileResponse { path } => {
            if !Path::new(&path).exists() {
                return Ok(BrainstormStatus::Unresolved);
            }
            let body = std::fs::read_to_string(&path).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
            let response: ResponseFile =
                serde_yaml::from_str(&body).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
            let by_id: std::collections::HashMap<String, ResponseEntry> =
                response.responses.into_iter().map(|r| (r.task_id.clone(), r)).collect();

            for (task, check, reason) in &flagged {
                let Some(entry) = by_id.get(&task.id) else {
                    continue;
                };
                let action = match entry.answer.as_str() {
                    "defer" => BrainstormAction::Defer {
                        trigger: entry.trigger.clone().unwrap_or_else(|| default_trigger(&task.id)),
                    },
                    "terminate" => BrainstormAction::Terminate,
                    "drop" => BrainstormAction::Drop,
                    _ => BrainstormAction::Keep,
                };
                apply_action(state, &task.id, &action)?;
                let question = question_text(*check, reason);
                record(state, hook_name, &task.id, question, &entry.answer, &action);
            }
            Ok(BrainstormStatus::Resolved)
        }
    }
}
