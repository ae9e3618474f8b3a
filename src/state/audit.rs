//! AuditItem entity — capability finding produced by `phases::audit`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Available,
    Extensible,
    Missing,
    InProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditItem {
    pub component: String,
    pub status: AuditStatus,
    pub description: String,
    /// Always includes the `matched_term` key.
    pub details: HashMap<String, String>,
}

impl AuditItem {
    pub fn matched_term(&self) -> Option<&str> {
        self.details.get("matched_term").map(String::as_str)
    }

    /// Dedup key used by `phases::audit` (component, matched_term).
    pub fn dedup_key(&self) -> (String, String) {
        (
            self.component.clone(),
            self.matched_term().unwrap_or_default().to_string(),
        )
    }
}
