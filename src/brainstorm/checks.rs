//! Risk checks — predicates over a task and its siblings that
//! surface a reason string when a task looks risky, or `None` when it's fine.

use crate::state::{Task, TaskKind, TaskStatus};
use regex::Regex;
use std::collections::HashSet;

/// Tunable keyword lists and thresholds for the risk checks. Small curated
/// tables, in the same spirit as `vocab`'s domain/method lists.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub external_dependency_keywords: Vec<String>,
    pub high_uncertainty_keywords: Vec<String>,
    pub long_critical_path_threshold: usize,
    pub novelty_indicators: Vec<String>,
    pub frontier_tags: Vec<String>,
    pub redundancy_jaccard_threshold: f64,
    pub low_value_keywords: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            external_dependency_keywords: vec![
                "third-party".into(),
                "external api".into(),
                "vendor".into(),
                "external dependency".into(),
            ],
            high_uncertainty_keywords: vec![
                "research".into(),
                "investigate".into(),
                "exploratory".into(),
                "spike".into(),
            ],
            long_critical_path_threshold: 4,
            novelty_indicators: vec!["port".into(), "migrate".into(), "migration".into()],
            frontier_tags: vec!["high".into(), "frontier".into()],
            redundancy_jaccard_threshold: 0.6,
            low_value_keywords: vec!["cleanup".into(), "boilerplate".into(), "scaffold".into()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    ExternalDependency,
    HighUncertainty,
    LongCriticalPath,
    NoveltyGap,
    RedundantWithPeers,
    LowRoi,
}

impl CheckKind {
    pub fn name(self) -> &'static str {
        match self {
            CheckKind::ExternalDependency => "external_dependency",
            CheckKind::HighUncertainty => "high_uncertainty",
            CheckKind::LongCriticalPath => "long_critical_path",
            CheckKind::NoveltyGap => "novelty_gap",
            CheckKind::RedundantWithPeers => "redundant_with_peers",
            CheckKind::LowRoi => "low_roi",
        }
    }
}

/// The full default check set, in a stable order.
pub const ALL_CHECKS: &[CheckKind] = &[
    CheckKind::ExternalDependency,
    CheckKind::HighUncertainty,
    CheckKind::LongCriticalPath,
    CheckKind::NoveltyGap,
    CheckKind::RedundantWithPeers,
    CheckKind::LowRoi,
];

fn haystack(task: &Task) -> String {
    format!("{} {}", task.title, task.description).to_lowercase()
}

/// Match any of `words` as a whole word in `text` — word-boundary regex
/// rather than a bare substring scan, so a short keyword like "port" doesn't
/// also fire on "report" or "important".
fn find_keyword<'a>(text: &str, words: &'a [String]) -> Option<&'a String> {
    words.iter().find(|k| {
        let pattern = format!(r"\b{}\b", regex::escape(k));
        Regex::new(&pattern)
            .map(|re| re.is_match(text))
            .unwrap_or(false)
    })
}

fn external_dependency(task: &Task, _all: &[Task], cfg: &RiskConfig) -> Option<String> {
    let text = haystack(task);
    find_keyword(&text, &cfg.external_dependency_keywords)
        .map(|k| format!("mentions external dependency keyword \"{k}\""))
}

fn high_uncertainty(task: &Task, _all: &[Task], cfg: &RiskConfig) -> Option<String> {
    let text = haystack(task);
    find_keyword(&text, &cfg.high_uncertainty_keywords)
        .map(|k| format!("mentions research/exploration keyword \"{k}\""))
}

/// Tasks transitively depending (directly or indirectly) on `task.id`.
fn transitive_downstream_count(task: &Task, all: &[Task]) -> usize {
    let mut downstream: HashSet<&str> = HashSet::new();
    let mut frontier = vec![task.id.as_str()];
    while let Some(id) = frontier.pop() {
        for t in all {
            if t.all_dependencies().iter().any(|d| d == id) && downstream.insert(t.id.as_str()) {
                frontier.push(t.id.as_str());
            }
        }
    }
    downstream.len()
}

fn long_critical_path(task: &Task, all: &[Task], cfg: &RiskConfig) -> Option<String> {
    let count = transitive_downstream_count(task, all);
    if count >= cfg.long_critical_path_threshold {
        Some(format!("{count} transitive downstream task(s) depend on this"))
    } else {
        None
    }
}

fn novelty_gap(task: &Task, _all: &[Task], cfg: &RiskConfig) -> Option<String> {
    let text = haystack(task);
    let carries_port_indicator = find_keyword(&text, &cfg.novelty_indicators).is_some();
    if !carries_port_indicator {
        return None;
    }
    let tagged_frontier = task
        .metadata
        .get("priority")
        .and_then(|v| v.as_str())
        .map(|v| cfg.frontier_tags.iter().any(|t| t == v))
        .unwrap_or(false);
    if tagged_frontier {
        Some("port/migrate task tagged high-priority/frontier".to_string())
    } else {
        None
    }
}

fn token_set(task: &Task) -> HashSet<String> {
    let mut set: HashSet<String> = crate::vocab::tokenize(&haystack(task)).into_iter().collect();
    for f in &task.anticipated_files {
        set.insert(f.to_lowercase());
    }
    set
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

fn redundant_with_peers(task: &Task, all: &[Task], cfg: &RiskConfig) -> Option<String> {
    let mine = token_set(task);
    for peer in all {
        if peer.id == task.id || peer.layer != task.layer {
            continue;
        }
        let theirs = token_set(peer);
        let score = jaccard(&mine, &theirs);
        if score >= cfg.redundancy_jaccard_threshold {
            return Some(format!(
                "overlaps {:.0}% with peer task {} in the same layer",
                score * 100.0,
                peer.id
            ));
        }
    }
    None
}

fn is_leaf(task: &Task, all: &[Task]) -> bool {
    !all.iter().any(|t| t.dependencies.iter().any(|d| d == &task.id))
}

fn low_roi(task: &Task, all: &[Task], cfg: &RiskConfig) -> Option<String> {
    if !is_leaf(task, all) {
        return None;
    }
    let text = haystack(task);
    let low_value_kind = matches!(task.kind, TaskKind::Test) || text.contains("documentation");
    if !low_value_kind {
        return None;
    }
    find_keyword(&text, &cfg.low_value_keywords)
        .map(|k| format!("leaf task of low-value kind mentioning \"{k}\""))
}

/// Run a single named check against a task.
pub fn run_check(kind: CheckKind, task: &Task, all: &[Task], cfg: &RiskConfig) -> Option<String> {
    match kind {
        CheckKind::ExternalDependency => external_dependency(task, all, cfg),
        CheckKind::HighUncertainty => high_uncertainty(task, all, cfg),
        CheckKind::LongCriticalPath => long_critical_path(task, all, cfg),
        CheckKind::NoveltyGap => novelty_gap(task, all, cfg),
        CheckKind::RedundantWithPeers => redundant_with_peers(task, all, cfg),
        CheckKind::LowRoi => low_roi(task, all, cfg),
    }
}

/// Run every check in `checks` against `task`, stopping at the first hit.
/// Only non-terminal, non-deferred tasks are worth flagging.
pub fn first_risk(
    checks: &[CheckKind],
    task: &Task,
    all: &[Task],
    cfg: &RiskConfig,
) -> Option<(CheckKind, String)> {
    if matches!(task.status, TaskStatus::Terminated | TaskStatus::Deferred) {
        return None;
    }
    checks
        .iter()
        .find_map(|kind| run_check(*kind, task, all, cfg).map(|reason| (*kind, reason)))
}
