//! `audit` phase — cross-reference intent terms against existing
//! capabilities.
//!
//! `CapabilityRegistry` and `BranchRegistry` are passed in explicitly rather
//! than reached for as globals: no global mutable
//! registry state lives in the core.

use crate::backends::{BranchRegistry, CapabilityRegistry};
use crate::error::{OrchestratorError, Result};
use crate::state::{AuditItem, AuditStatus, Phase, ProjectState};
use crate::vocab::extension_hint;
use std::collections::{HashMap, HashSet};

fn terms(state: &ProjectState) -> Vec<String> {
    let mut set: HashSet<String> = HashSet::new();
    for key in ["keywords", "domain", "method"] {
        if let Some(arr) = state.parsed_intent.get(key).and_then(|v| v.as_array()) {
            for v in arr {
                if let Some(s) = v.as_str() {
                    set.insert(s.to_string());
                }
            }
        }
    }
    let mut v: Vec<String> = set.into_iter().collect();
    v.sort();
    v
}

fn details(matched_term: &str, extra: &[(&str, &str)]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("matched_term".to_string(), matched_term.to_string());
    for (k, v) in extra {
        map.insert(k.to_string(), v.to_string());
    }
    map
}

/// Run the audit phase and advance to `Decompose`.
pub fn run(
    mut state: ProjectState,
    capability_registry: &dyn CapabilityRegistry,
    branch_registry: &dyn BranchRegistry,
) -> Result<ProjectState> {
    if state.phase != Phase::Audit {
        return Err(OrchestratorError::PhasePrecondition {
            expected: "audit".to_string(),
            actual: state.phase.as_str().to_string(),
        });
    }

    let mut items: Vec<AuditItem> = Vec::new();

    for term in terms(&state) {
        if branch_registry.has_in_progress(&term) {
            items.push(AuditItem {
                component: term.clone(),
                status: AuditStatus::InProgress,
                description: format!("{term} is under active development on another branch"),
                details: details(&term, &[]),
            });
            continue;
        }

        let hits = capability_registry.search(&term);
        if !hits.is_empty() {
            for hit in hits {
                items.push(AuditItem {
                    component: hit.component.clone(),
                    status: AuditStatus::Available,
                    description: format!("{} already provides {}", hit.component, term),
                    details: details(
                        &term,
                        &[("category", &hit.category), ("value", &hit.value)],
                    ),
                });
            }
            continue;
        }

        match extension_hint(&term) {
            Some(hinted) if !capability_registry.search(hinted).is_empty() => {
                items.push(AuditItem {
                    component: hinted.to_string(),
                    status: AuditStatus::Extensible,
                    description: format!("{hinted} can be extended to cover {term}"),
                    details: details(&term, &[("hint", hinted)]),
                });
            }
            _ => {
                items.push(AuditItem {
                    component: term.clone(),
                    status: AuditStatus::Missing,
                    description: format!("no existing capability covers {term}"),
                    details: details(&term, &[]),
                });
            }
        }
    }

    // Deduplicate by (component, matched_term).
    let mut seen: HashSet<(String, String)> = HashSet::new();
    items.retain(|item| seen.insert(item.dedup_key()));

    state.record_event("audit", format!("produced {} audit item(s)", items.len()));
    state.audit_items = items;
    state.phase = Phase::Decompose;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::{EmptyBranchRegistry, InMemoryCapabilityRegistry};
    use crate::phases::intake;

    fn intaken(request: &str) -> ProjectState {
        intake::run(ProjectState::new(request)).unwrap()
    }

    #[test]
    fn missing_capability_yields_missing_item() {
        let state = intaken("Add billing support");
        let registry = InMemoryCapabilityRegistry::new();
        let branches = EmptyBranchRegistry;
        let state = run(state, &registry, &branches).unwrap();
        assert!(state
            .audit_items
            .iter()
            .any(|i| i.status == AuditStatus::Missing && i.component == "billing"));
    }

    #[test]
    fn available_capability_yields_available_item() {
        let state = intaken("Add billing support");
        let registry = InMemoryCapabilityRegistry::new().with_capability(
            "billing",
            "status",
            "implemented",
        );
        let branches = EmptyBranchRegistry;
        let state = run(state, &registry, &branches).unwrap();
        assert!(state
            .audit_items
            .iter()
            .any(|i| i.status == AuditStatus::Available && i.component == "billing"));
    }

    #[test]
    fn extensible_hint_used_when_hinted_component_exists() {
        let state = intaken("Add payment processing");
        let registry = InMemoryCapabilityRegistry::new().with_capability(
            "billing",
            "status",
            "implemented",
        );
        let branches = EmptyBranchRegistry;
        let state = run(state, &registry, &branches).unwrap();
        assert!(state
            .audit_items
            .iter()
            .any(|i| i.status == AuditStatus::Extensible && i.component == "billing"));
    }

    #[test]
    fn in_progress_branch_short_circuits_registry() {
        let state = intaken("Add billing support");
        let registry = InMemoryCapabilityRegistry::new().with_capability(
            "billing",
            "status",
            "implemented",
        );

        struct BranchInProgress;
        impl BranchRegistry for BranchInProgress {
            fn get_in_progress(&self, _component: &str) -> Vec<crate::backends::BranchEntry> {
                vec![]
            }
            fn has_in_progress(&self, _capability_keyword: &str) -> bool {
                true
            }
        }

        let state = run(state, &registry, &BranchInProgress).unwrap();
        assert!(state
            .audit_items
            .iter()
            .any(|i| i.status == AuditStatus::InProgress));
        assert!(!state
            .audit_items
            .iter()
            .any(|i| i.status == AuditStatus::Available));
    }

    #[test]
    fn dedup_by_component_and_matched_term() {
        let state = intaken("Add billing billing billing");
        let registry = InMemoryCapabilityRegistry::new();
        let branches = EmptyBranchRegistry;
        let state = run(state, &registry, &branches).unwrap();
        let billing_items: Vec<_> = state
            .audit_items
            .iter()
            .filter(|i| i.component == "billing")
            .collect();
        assert_eq!(billing_items.len(), 1);
    }
}
