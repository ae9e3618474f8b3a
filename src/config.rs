//! Layered configuration: defaults, overridden by an optional TOML file,
//! overridden by environment variables — the same CLI/env > file > default
//! precedence the daemon's own config layer uses.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct TaskpilotConfig {
    pub state_path: PathBuf,
    pub max_revisions: u32,
    pub max_gate_retries: u32,
    pub long_critical_path_threshold: usize,
    pub redundancy_jaccard_threshold: f64,
}

impl Default for TaskpilotConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("taskpilot_state.json"),
            max_revisions: crate::orchestrator::MAX_REVISIONS,
            max_gate_retries: crate::orchestrator::MAX_GATE_RETRIES,
            long_critical_path_threshold: 4,
            redundancy_jaccard_threshold: 0.6,
        }
    }
}

/// Mirrors `TaskpilotConfig` with every field optional, for partial TOML
/// overrides (teacher's `TomlConfig` pattern).
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    state_path: Option<PathBuf>,
    max_revisions: Option<u32>,
    max_gate_retries: Option<u32>,
    long_critical_path_threshold: Option<usize>,
    redundancy_jaccard_threshold: Option<f64>,
}

impl TaskpilotConfig {
    fn merge_toml(&mut self, file: TomlConfig) {
        if let Some(v) = file.state_path {
            self.state_path = v;
        }
        if let Some(v) = file.max_revisions {
            self.max_revisions = v;
        }
        if let Some(v) = file.max_gate_retries {
            self.max_gate_retries = v;
        }
        if let Some(v) = file.long_critical_path_threshold {
            self.long_critical_path_threshold = v;
        }
        if let Some(v) = file.redundancy_jaccard_threshold {
            self.redundancy_jaccard_threshold = v;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("TASKPILOT_STATE_PATH") {
            self.state_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TASKPILOT_MAX_REVISIONS") {
            if let Ok(parsed) = v.parse() {
                self.max_revisions = parsed;
            }
        }
        if let Ok(v) = std::env::var("TASKPILOT_MAX_GATE_RETRIES") {
            if let Ok(parsed) = v.parse() {
                self.max_gate_retries = parsed;
            }
        }
    }
}

/// Load config: defaults, then an optional TOML file at `path`, then
/// environment variable overrides.
pub fn load(path: Option<&Path>) -> anyhow::Result<TaskpilotConfig> {
    let mut cfg = TaskpilotConfig::default();
    if let Some(p) = path {
        if p.exists() {
            let body = std::fs::read_to_string(p)?;
            let file_cfg: TomlConfig = toml::from_str(&body)?;
            cfg.merge_toml(file_cfg);
        }
    }
    cfg.apply_env();
    Ok(cfg)
}
