//! `intake` phase — tokenize the raw request and extract intent.

use crate::error::{OrchestratorError, Result};
use crate::state::{Phase, ProjectState};
use crate::vocab::{tokenize, DOMAIN_VOCAB, METHOD_VOCAB, VALIDATION_VOCAB};
use serde_json::json;
use std::collections::HashSet;

/// Tokenize the lowercased request, extract matching terms from the three
/// curated vocabularies, populate `parsed_intent`, and advance the phase to
/// `Audit`.
pub fn run(mut state: ProjectState) -> Result<ProjectState> {
    if state.phase != Phase::Intake {
        return Err(OrchestratorError::PhasePrecondition {
            expected: "intake".to_string(),
            actual: state.phase.as_str().to_string(),
        });
    }

    let tokens = tokenize(&state.raw_request);
    let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    let domain: Vec<String> = DOMAIN_VOCAB
        .iter()
        .filter(|w| token_set.contains(*w))
        .map(|w| w.to_string())
        .collect();
    let method: Vec<String> = METHOD_VOCAB
        .iter()
        .filter(|w| token_set.contains(*w))
        .map(|w| w.to_string())
        .collect();
    let validation: Vec<String> = VALIDATION_VOCAB
        .iter()
        .filter(|w| token_set.contains(*w))
        .map(|w| w.to_string())
        .collect();

    state
        .parsed_intent
        .insert("domain".to_string(), json!(domain));
    state
        .parsed_intent
        .insert("method".to_string(), json!(method));
    state
        .parsed_intent
        .insert("validation".to_string(), json!(validation));
    state
        .parsed_intent
        .insert("keywords".to_string(), json!(tokens.clone()));
    state.parsed_intent.insert(
        "raw_request".to_string(),
        json!(state.raw_request.clone()),
    );

    state.optimization_metadata.insert(
        "intake_token_stats".to_string(),
        json!({
            "raw_token_count": state.raw_request.split_whitespace().count(),
            "filtered_token_count": tokens.len(),
        }),
    );

    state.record_event(
        "intake",
        format!("extracted {} keyword(s) from request", tokens.len()),
    );
    state.phase = Phase::Audit;
    Ok(state)
}
