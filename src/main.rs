//! `taskpilot` CLI — drives a project from a raw request through intake,
//! audit, decompose, and the execute/verify orchestrator, using the toy
//! in-memory backends by default. Real specialist/reviewer/gate backends
//! are a matter of swapping the trait objects passed to `Orchestrator::new`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskpilot::backends::mock::{
    AlwaysPassIntegrationRunner, EmptyBranchRegistry, InMemoryCapabilityRegistry, MockSpecialist,
    ScriptedGateRunner, ScriptedReviewer,
};
use taskpilot::brainstorm::{BrainstormMode, ALL_CHECKS};
use taskpilot::hooks::ALL_AI_CHECKS;
use taskpilot::hooks::engine::{run_hook_point, HookConfig, HookPoint};
use taskpilot::observability;
use taskpilot::orchestrator::Orchestrator;
use taskpilot::phases::{audit, decompose, intake};
use taskpilot::state::{Phase, ProjectState};
use taskpilot::{config, persistence};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskpilot", about = "plan and drive human-AI collaborative development")]
struct Cli {
    #[arg(long, env = "TASKPILOT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a new project from a raw request, running every phase through
    /// to completion (or the first blocking pause).
    Run {
        raw_request: String,
    },
    /// Resume a previously saved, possibly-blocked project from disk.
    Resume,
    /// Run the brainstorm subsystem in isolation against the saved state.
    Brainstorm {
        #[arg(long, default_value = "auto")]
        mode: String,
    },
    /// Print a health summary of the saved state.
    Show,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run { raw_request } => cmd_run(&cfg, raw_request).await,
        Command::Resume => cmd_resume(&cfg).await,
        Command::Brainstorm { mode } => cmd_brainstorm(&cfg, &mode),
        Command::Show => cmd_show(&cfg),
    }
}

fn capability_registry() -> InMemoryCapabilityRegistry {
    InMemoryCapabilityRegistry::new()
}

async fn cmd_run(cfg: &config::TaskpilotConfig, raw_request: String) -> anyhow::Result<()> {
    let state = ProjectState::new(raw_request);
    drive(cfg, state).await
}

async fn cmd_resume(cfg: &config::TaskpilotConfig) -> anyhow::Result<()> {
    let state = persistence::load(&cfg.state_path)?;
    drive(cfg, state).await
}

async fn drive(cfg: &config::TaskpilotConfig, mut state: ProjectState) -> anyhow::Result<()> {
    let capability_registry = capability_registry();
    let branch_registry = EmptyBranchRegistry;

    if state.phase == Phase::Intake {
        state = intake::run(state)?;
    }
    if state.phase == Phase::Audit {
        state = audit::run(state, &capability_registry, &branch_registry)?;
        run_hook_point(
            &mut state,
            HookPoint::AfterAudit,
            &hook_config(),
            &capability_registry,
            &branch_registry,
            None,
            None,
        )?;
    }
    if state.phase == Phase::Decompose {
        state = decompose::run(state)?;
        run_hook_point(
            &mut state,
            HookPoint::AfterDecompose,
            &hook_config(),
            &capability_registry,
            &branch_registry,
            None,
            None,
        )?;
    }

    if state.blocked_reason.is_some() {
        persistence::save(&state, &cfg.state_path)?;
        print_health(&state);
        return Ok(());
    }

    let specialist = MockSpecialist;
    let reviewer = ScriptedReviewer::always_approve();
    let gate_registry = taskpilot::backends::mock::SimpleGateRegistry::new(ScriptedGateRunner::new());
    let integration_runner = AlwaysPassIntegrationRunner;
    let orchestrator = Orchestrator::new(&specialist, &reviewer, &gate_registry, &integration_runner);

    let state_path = cfg.state_path.clone();
    let mut persist = move |s: &ProjectState| -> taskpilot::Result<()> { persistence::save(s, &state_path) };
    let final_state = orchestrator
        .run(state, Some(&mut persist as &mut taskpilot::orchestrator::Persister<'_>))
        .await?;

    persistence::save(&final_state, &cfg.state_path)?;
    print_health(&final_state);
    Ok(())
}

fn hook_config() -> HookConfig {
    HookConfig {
        ai_review_checks: ALL_AI_CHECKS.to_vec(),
        brainstorm_checks: ALL_CHECKS.to_vec(),
        risk_config: Default::default(),
        run_brainstorm: true,
        human_check_mode: None,
    }
}

fn cmd_brainstorm(cfg: &config::TaskpilotConfig, mode: &str) -> anyhow::Result<()> {
    let mut state = persistence::load(&cfg.state_path)?;
    let brainstorm_mode = match mode {
        "auto" => BrainstormMode::Auto,
        "interactive" => BrainstormMode::Interactive,
        other => anyhow::bail!("unsupported brainstorm mode: {other}"),
    };
    let risk_config = Default::default();
    let status = taskpilot::brainstorm::engine::run_brainstorm(
        &mut state,
        "manual_brainstorm",
        ALL_CHECKS,
        &risk_config,
        brainstorm_mode,
        None,
    )?;
    tracing::info!(?status, "brainstorm pass complete");
    persistence::save(&state, &cfg.state_path)?;
    print_health(&state);
    Ok(())
}

fn cmd_show(cfg: &config::TaskpilotConfig) -> anyhow::Result<()> {
    let state = persistence::load(&cfg.state_path)?;
    print_health(&state);
    Ok(())
}

fn print_health(state: &ProjectState) {
    let health = observability::summarize(state);
    println!("phase: {}", health.phase);
    if let Some(reason) = &health.blocked_reason {
        println!("blocked: {reason}");
    }
    println!(
        "tasks: {} total, {} done, {} pending, {} in progress, {} deferred, {} failed, {} terminated",
        health.tasks_total,
        health.tasks_done,
        health.tasks_pending,
        health.tasks_in_progress,
        health.tasks_deferred,
        health.tasks_failed,
        health.tasks_terminated
    );
}
