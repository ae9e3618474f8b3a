//! Durable, resumable state storage — plain JSON-on-disk with an atomic
//! rename, no particular backend required beyond durable and resumable.

use crate::error::{OrchestratorError, Result};
use crate::state::ProjectState;
use std::path::Path;

/// Serialize `state` to `path` via a temp-file-then-rename so a crash
/// mid-write never leaves a half-written state file behind.
pub fn save(state: &ProjectState, path: &Path) -> Result<()> {
    let body = serde_json::to_string_pretty(state).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, body).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
    std::fs::rename(&tmp_path, path).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
    Ok(())
}

/// Load a previously saved state. Missing optional fields default per
/// `serde(default)` to their natural empty values.
pub fn load(path: &Path) -> Result<ProjectState> {
    let body = std::fs::read_to_string(path).map_err(|e| OrchestratorError::Persistence(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| OrchestratorError::Persistence(e.to_string()))
}
