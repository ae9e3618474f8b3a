//! Curated vocabularies used by `phases::intake` and `phases::audit`.
//!
//! Small hand-maintained tables, in the style of `autonomous::plan_generator`'s
//! modal-verb list and `SOURCE_EXTENSIONS` constant — not configuration-driven,
//! because these are linguistic heuristics rather than deployment parameters.

use std::collections::HashSet;

/// Words too common/short to carry intent signal; excluded from tokenization.
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "has",
    "have", "this", "that", "with", "from", "into", "will", "should", "would",
    "could", "which", "their", "there", "when", "where", "what", "who", "why",
    "how", "add", "new", "feature", "please", "want", "need", "able", "like",
];

/// Domain vocabulary — subject-matter nouns a request might name.
pub const DOMAIN_VOCAB: &[&str] = &[
    "auth", "authentication", "authorization", "billing", "payment",
    "search", "indexing", "recommendation", "notification", "messaging",
    "analytics", "reporting", "dashboard", "inventory", "catalog",
    "scheduling", "workflow", "pipeline", "storage", "cache", "queue",
    "session", "user", "profile", "permission", "audit", "compliance",
];

/// Method vocabulary — techniques/approaches a request might name.
pub const METHOD_VOCAB: &[&str] = &[
    "rest", "graphql", "grpc", "websocket", "batch", "streaming", "async",
    "sync", "retry", "backoff", "cache", "index", "embedding", "vector",
    "regex", "parser", "compiler", "scheduler", "queue", "worker", "cron",
    "migration", "replication", "sharding", "encryption", "hashing",
];

/// Validation vocabulary — quality/verification concerns a request might name.
pub const VALIDATION_VOCAB: &[&str] = &[
    "test", "testing", "validation", "verification", "contract", "schema",
    "lint", "benchmark", "regression", "coverage", "fuzz", "property",
    "invariant", "assertion", "numeric", "tolerance", "accuracy",
];

/// Maps a component name that is `Missing` to a hinted alternative component
/// that might already exist in an extensible form.
pub fn extension_hint(component: &str) -> Option<&'static str> {
    match component {
        "authentication" => Some("session"),
        "payment" => Some("billing"),
        "recommendation" => Some("analytics"),
        "notification" => Some("messaging"),
        "indexing" => Some("search"),
        _ => None,
    }
}

/// Tokenize `text`: lowercase, alphanumeric words of length >= 3, excluding
/// `STOP_WORDS`.
pub fn tokenize(text: &str) -> Vec<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 3 && !stop.contains(w))
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_filters_short_stop_words() {
        let tokens = tokenize("Add OAuth Authentication to the API please");
        assert!(tokens.contains(&"oauth".to_string()));
        assert!(tokens.contains(&"authentication".to_string()));
        assert!(!tokens.contains(&"add".to_string()));
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"to".to_string())); // too short
    }

    #[test]
    fn extension_hint_known_component() {
        assert_eq!(extension_hint("authentication"), Some("session"));
        assert_eq!(extension_hint("unknown-thing"), None);
    }
}
