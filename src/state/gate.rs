//! GateResult entity and the `"<task_id>:<gate_kind>"` keying scheme.

use crate::state::task::GateKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub task_id: String,
    pub gate_kind: GateKind,
    pub status: GateStatus,
    pub raw_output: String,
}

/// Build the storage key for a `GateResult`: `"<task_id>:<gate_kind>"`.
pub fn gate_key(task_id: &str, kind: GateKind) -> String {
    format!("{task_id}:{}", kind.as_str())
}

/// Parse a stored gate key back into `(task_id, gate_kind_str)`. Used by
/// `scheduler::check_deferred_triggers` when matching trigger conditions
/// against gate output keyed `TASK:*`.
pub fn split_gate_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_key_format() {
        assert_eq!(gate_key("FE-205", GateKind::Unit), "FE-205:unit");
    }

    #[test]
    fn split_gate_key_roundtrip() {
        let key = gate_key("T-3", GateKind::Contract);
        assert_eq!(split_gate_key(&key), Some(("T-3", "contract")));
    }
}
