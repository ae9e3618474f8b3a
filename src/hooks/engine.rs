//! Hook dispatch — runs the configured hook kinds, in order, at a named
//! hook point: ai_review -> brainstorm/critical_review -> human_check ->
//! regenerate.

use crate::backends::{BranchRegistry, CapabilityRegistry};
use crate::brainstorm::checks::{CheckKind, RiskConfig};
use crate::brainstorm::engine::{run_brainstorm, BrainstormAction, BrainstormMode, BrainstormStatus};
use crate::error::Result;
use crate::hooks::ai_review::{self, AiCheckKind};
use crate::hooks::human_check::{self, HumanCheckMode, HumanCheckStatus, HumanDecision};
use crate::hooks::regenerate;
use crate::state::{ProjectState, Task};
use serde_json::json;

pub const MAX_AI_REVIEW_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    AfterAudit,
    AfterDecompose,
    AfterTaskComplete,
}

impl HookPoint {
    pub fn as_str(self) -> &'static str {
        match self {
            HookPoint::AfterAudit => "after_audit",
            HookPoint::AfterDecompose => "after_decompose",
            HookPoint::AfterTaskComplete => "after_task_complete",
        }
    }
}

/// Which hook kinds run at a point, and their configuration.
pub struct HookConfig {
    pub ai_review_checks: Vec<AiCheckKind>,
    pub brainstorm_checks: Vec<CheckKind>,
    pub risk_config: RiskConfig,
    pub run_brainstorm: bool,
    pub human_check_mode: Option<HumanCheckModeChoice>,
}

/// Which concrete `HumanCheckMode` to construct — kept separate from
/// `human_check::HumanCheckMode` so a config can be cloned/reused without
/// owning a live decider closure.
pub enum HumanCheckModeChoice {
    Interactive,
    File { prompt_path: std::path::PathBuf, response_path: std::path::PathBuf, is_second_pass: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Continue,
    Blocked,
}

fn retry_count(state: &ProjectState, hook_name: &str) -> u64 {
    state
        .optimization_metadata
        .get("hook_retries")
        .and_then(|v| v.get(hook_name))
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

fn set_retry_count(state: &mut ProjectState, hook_name: &str, count: u64) {
    let table = state
        .optimization_metadata
        .entry("hook_retries".to_string())
        .or_insert_with(|| json!({}));
    if let Some(obj) = table.as_object_mut() {
        obj.insert(hook_name.to_string(), json!(count));
    }
}

/// Run `ai_review`, tracking a per-hook retry budget in
/// `optimization_metadata` — capped at 3 attempts per hook.
fn run_ai_review_step(
    state: &mut ProjectState,
    hook_name: &str,
    checks: &[AiCheckKind],
    capability_registry: &dyn CapabilityRegistry,
    branch_registry: &dyn BranchRegistry,
) -> HookOutcome {
    let review = ai_review::run(state, hook_name, checks, capability_registry, branch_registry);
    let approved = review.approved;
    state.review_results.push(review.clone());

    if approved {
        set_retry_count(state, hook_name, 0);
        return HookOutcome::Continue;
    }

    let attempts = retry_count(state, hook_name) + 1;
    set_retry_count(state, hook_name, attempts);
    if attempts >= MAX_AI_REVIEW_ATTEMPTS as u64 {
        state.blocked_reason = Some(format!(
            "ai_review hook {hook_name} exhausted {attempts} attempt(s): {}",
            review.issues.join("; ")
        ));
        HookOutcome::Blocked
    } else {
        // Caller is expected to re-run the preceding phase with
        // `review.suggestions` before re-entering this hook point.
        HookOutcome::Blocked
    }
}

/// Run every configured hook kind at `point`, in the fixed dispatch order. Returns
/// `Blocked` the moment any step sets `blocked_reason` or stays unresolved.
#[allow(clippy::too_many_arguments)]
pub fn run_hook_point(
    state: &mut ProjectState,
    point: HookPoint,
    config: &HookConfig,
    capability_registry: &dyn CapabilityRegistry,
    branch_registry: &dyn BranchRegistry,
    brainstorm_decider: Option<&mut dyn FnMut(&Task, CheckKind, &str) -> BrainstormAction>,
    human_decider: Option<&mut dyn FnMut() -> HumanDecision>,
) -> Result<HookOutcome> {
    let hook_name = point.as_str();

    if run_ai_review_step(state, hook_name, &config.ai_review_checks, capability_registry, branch_registry)
        == HookOutcome::Blocked
    {
        return Ok(HookOutcome::Blocked);
    }

    if config.run_brainstorm {
        let mode = BrainstormMode::Auto;
        let status = run_brainstorm(
            state,
            hook_name,
            &config.brainstorm_checks,
            &config.risk_config,
            mode,
            brainstorm_decider,
        )?;
        if status == BrainstormStatus::Unresolved {
            state.blocked_reason = Some(format!("brainstorm hook {hook_name} unresolved"));
            return Ok(HookOutcome::Blocked);
        }
    }

    if let Some(choice) = &config.human_check_mode {
        let mode = match choice {
            HumanCheckModeChoice::Interactive => HumanCheckMode::Interactive,
            HumanCheckModeChoice::File { prompt_path, response_path, is_second_pass } => {
                if *is_second_pass {
                    HumanCheckMode::FileResponse { path: response_path.clone() }
                } else {
                    HumanCheckMode::FilePrompt { path: prompt_path.clone() }
                }
            }
        };
        let status = human_check::run_human_check(state, hook_name, mode, human_decider)?;
        match status {
            HumanCheckStatus::Approved => {}
            HumanCheckStatus::Rejected | HumanCheckStatus::Paused | HumanCheckStatus::Unresolved => {
                return Ok(HookOutcome::Blocked);
            }
        }
    }

    regenerate::run(state, hook_name);
    Ok(HookOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::{EmptyBranchRegistry, InMemoryCapabilityRegistry};

    #[test]
    fn clean_state_passes_through_all_hooks() {
        let mut state = ProjectState::new("demo");
        let config = HookConfig {
            ai_review_checks: ai_review::ALL_AI_CHECKS.to_vec(),
            brainstorm_checks: crate::brainstorm::ALL_CHECKS.to_vec(),
            risk_config: RiskConfig::default(),
            run_brainstorm: true,
            human_check_mode: None,
        };
        let registry = InMemoryCapabilityRegistry::new();
        let branches = EmptyBranchRegistry;
        let outcome = run_hook_point(
            &mut state,
            HookPoint::AfterAudit,
            &config,
            &registry,
            &branches,
            None,
            None,
        )
        .unwrap();
        assert_eq!(outcome, HookOutcome::Continue);
        assert!(state.blocked_reason.is_none());
    }

    #[test]
    fn failing_ai_review_blocks_and_tracks_attempts() {
        use crate::state::{AuditItem, AuditStatus};
        let mut state = ProjectState::new("demo");
        state.audit_items.push(AuditItem {
            component: "billing".to_string(),
            status: AuditStatus::Missing,
            description: "no billing".to_string(),
            details: Default::default(),
        });
        let config = HookConfig {
            ai_review_checks: vec![AiCheckKind::Completeness],
            brainstorm_checks: vec![],
            risk_config: RiskConfig::default(),
            run_brainstorm: false,
            human_check_mode: None,
        };
        let registry = InMemoryCapabilityRegistry::new();
        let branches = EmptyBranchRegistry;

        for expected_attempts in 1..=MAX_AI_REVIEW_ATTEMPTS {
            let outcome = run_hook_point(
                &mut state,
                HookPoint::AfterDecompose,
                &config,
                &registry,
                &branches,
                None,
                None,
            )
            .unwrap();
            assert_eq!(outcome, HookOutcome::Blocked);
            assert_eq!(retry_count(&state, "after_decompose"), expected_attempts as u64);
        }
        assert!(state.blocked_reason.is_some());
    }
}
