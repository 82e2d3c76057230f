//! Per-scenario triage: group raw step failures, correlate console output,
//! classify, fingerprint and attach remediation + a ticket draft.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactIndex;
use crate::classify::classify_failure;
use crate::fingerprint::fingerprint_failure;
use crate::model::{RunContext, ScenarioTriageRecord};
use crate::remediation::suggest_fixes;
use crate::report_stream::RawStepFailure;
use crate::ticket::{DraftRequest, build_ticket_draft};

pub const DEFAULT_FEATURE: &str = "Feature";
pub const CONSOLE_MAX_LINES: usize = 120;
pub const CONSOLE_MAX_CHARS: usize = 12_000;
pub const TOP_ERROR_MAX_CHARS: usize = 160;
pub const TICKET_ERROR_MAX_CHARS: usize = 1_500;
const SCENARIO_TOKEN_MIN: usize = 4;
const ERROR_TOKEN_MIN: usize = 5;

/// Identity of one logical failing scenario.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScenarioGroupKey {
    pub uri: String,
    pub line: Option<u64>,
    pub feature: String,
    pub scenario: String,
}

impl ScenarioGroupKey {
    #[must_use]
    pub fn of(failure: &RawStepFailure) -> Self {
        Self {
            uri: failure.uri.clone().unwrap_or_default(),
            line: failure.line,
            feature: failure.feature_name.clone().unwrap_or_default(),
            scenario: failure.scenario_name.clone(),
        }
    }
}

/// All step failures sharing one [`ScenarioGroupKey`], in report order.
#[derive(Debug, Clone)]
pub struct ScenarioGroup<'a> {
    pub key: ScenarioGroupKey,
    pub failures: Vec<&'a RawStepFailure>,
}

/// Group failures by scenario identity, keeping first-seen group order.
#[must_use]
pub fn group_by_scenario(failures: &[RawStepFailure]) -> Vec<ScenarioGroup<'_>> {
    let mut index: HashMap<ScenarioGroupKey, usize> = HashMap::new();
    let mut groups: Vec<ScenarioGroup<'_>> = Vec::new();
    for failure in failures {
        let key = ScenarioGroupKey::of(failure);
        if let Some(&idx) = index.get(&key) {
            groups[idx].failures.push(failure);
        } else {
            index.insert(key.clone(), groups.len());
            groups.push(ScenarioGroup {
                key,
                failures: vec![failure],
            });
        }
    }
    groups
}

/// Everything the aggregator needs for one run.
#[derive(Debug, Clone, Copy)]
pub struct TriageInput<'a> {
    pub failures: &'a [RawStepFailure],
    /// Failures in the whole run; feeds the classifier's volume heuristic.
    pub run_failure_count: usize,
    pub console_log: Option<&'a str>,
    pub context: &'a RunContext,
    pub jira_project_key: &'a str,
    pub jira_issue_type: &'a str,
    pub artifacts: &'a ArtifactIndex,
}

/// Produce one triage record per failing scenario, sorted by confidence
/// (desc), category name, then scenario name.
#[must_use]
pub fn triage_failures_per_scenario(input: &TriageInput<'_>) -> Vec<ScenarioTriageRecord> {
    let groups = group_by_scenario(input.failures);
    tracing::debug!(
        failures = input.failures.len(),
        groups = groups.len(),
        run_failure_count = input.run_failure_count,
        "Triaging scenario groups"
    );

    let mut records: Vec<ScenarioTriageRecord> =
        groups.iter().map(|group| triage_group(group, input)).collect();
    sort_records(&mut records);
    records
}

fn triage_group(group: &ScenarioGroup<'_>, input: &TriageInput<'_>) -> ScenarioTriageRecord {
    let first = group.failures[0];
    let feature = first.feature_name.as_deref().unwrap_or(DEFAULT_FEATURE);
    let scenario = first.scenario_name.as_str();
    let step = first.step_label();
    let location = location_of(first);

    let errors: Vec<&str> = group
        .failures
        .iter()
        .map(|f| f.error_message.as_deref().unwrap_or(""))
        .collect();
    let console_context = correlate_console(input.console_log, scenario, &errors);
    let blob = compose_blob(feature, scenario, &location, &group.failures, &console_context);

    let classification = classify_failure(&blob, input.run_failure_count);
    let first_error = group
        .failures
        .iter()
        .filter_map(|f| f.error_message.as_deref())
        .find(|msg| !msg.is_empty())
        .unwrap_or("");
    let top_error = first_line(first_error, TOP_ERROR_MAX_CHARS);

    let fingerprint = fingerprint_failure(&[
        classification.category.as_str(),
        feature,
        scenario,
        top_error.as_str(),
        location.as_str(),
    ]);
    let suggested_fix = suggest_fixes(classification.category, &blob);
    let snippet = truncate_chars(first_error, TICKET_ERROR_MAX_CHARS);

    let jira_draft = build_ticket_draft(&DraftRequest {
        project_key: input.jira_project_key,
        issue_type: input.jira_issue_type,
        category: classification.category,
        confidence: classification.confidence,
        fingerprint: &fingerprint,
        feature,
        scenario,
        step: &step,
        location: &location,
        top_error_snippet: snippet,
        suggested_fixes: &suggested_fix,
        context: input.context,
        artifacts: input.artifacts,
    });

    ScenarioTriageRecord {
        feature: feature.to_string(),
        scenario: scenario.to_string(),
        step,
        location,
        category: classification.category,
        confidence: round2(classification.confidence),
        fingerprint,
        top_error,
        evidence: classification.evidence,
        suggested_fix,
        jira_draft,
    }
}

/// `uri:line`, omitting whichever part is absent.
#[must_use]
pub fn location_of(failure: &RawStepFailure) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(2);
    if let Some(uri) = failure.uri.as_deref().filter(|u| !u.is_empty()) {
        parts.push(uri.to_string());
    }
    if let Some(line) = failure.line.filter(|&l| l != 0) {
        parts.push(line.to_string());
    }
    parts.join(":")
}

fn compose_blob(
    feature: &str,
    scenario: &str,
    location: &str,
    failures: &[&RawStepFailure],
    console_context: &str,
) -> String {
    let step_errors = failures
        .iter()
        .map(|f| {
            format!(
                "STEP: {}\nSTATUS: {}\nERROR:\n{}",
                f.step_label(),
                f.status,
                f.error_message.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!(
        "FEATURE: {feature}\nSCENARIO: {scenario}\nLOC: {location}\n\n{step_errors}\n\n==== CONSOLE ====\n{console_context}"
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Console correlation
// ────────────────────────────────────────────────────────────────────────────

fn word_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
}

/// Lowercased keywords: scenario tokens of 4+ chars, error tokens of 5+.
#[must_use]
pub fn console_keywords(scenario: &str, errors: &[&str]) -> BTreeSet<String> {
    let mut keywords = BTreeSet::new();
    for token in word_tokens(scenario) {
        if token.len() >= SCENARIO_TOKEN_MIN {
            keywords.insert(token.to_ascii_lowercase());
        }
    }
    for error in errors {
        for token in word_tokens(error) {
            if token.len() >= ERROR_TOKEN_MIN {
                keywords.insert(token.to_ascii_lowercase());
            }
        }
    }
    keywords
}

/// Pick console lines relevant to a scenario.
///
/// Lines mentioning any keyword are kept (first 120). With no hits the last
/// 120 lines are used instead. The excerpt is capped at 12,000 chars.
#[must_use]
pub fn correlate_console(console_log: Option<&str>, scenario: &str, errors: &[&str]) -> String {
    let Some(log) = console_log.filter(|log| !log.is_empty()) else {
        return String::new();
    };
    let lines: Vec<&str> = log.lines().collect();
    let keywords = console_keywords(scenario, errors);

    let mut selected: Vec<&str> = if keywords.is_empty() {
        Vec::new()
    } else {
        lines
            .iter()
            .copied()
            .filter(|line| {
                let lower = line.to_lowercase();
                keywords.iter().any(|k| lower.contains(k.as_str()))
            })
            .collect()
    };

    if selected.is_empty() {
        selected = lines[lines.len().saturating_sub(CONSOLE_MAX_LINES)..].to_vec();
    } else {
        selected.truncate(CONSOLE_MAX_LINES);
    }

    shorten(&selected.join("\n"), CONSOLE_MAX_CHARS)
}

fn shorten(text: &str, max_chars: usize) -> String {
    let kept = truncate_chars(text, max_chars);
    if kept.len() == text.len() {
        return text.to_string();
    }
    let dropped = text.chars().count() - max_chars;
    format!("{kept}\n...[truncated {dropped} chars]")
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// First line of `text`, ellipsized to `max_chars`.
#[must_use]
pub fn first_line(text: &str, max_chars: usize) -> String {
    let line = text.split('\n').next().unwrap_or("");
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let kept = truncate_chars(line, max_chars.saturating_sub(1));
    format!("{kept}…")
}

// ────────────────────────────────────────────────────────────────────────────
// Ordering
// ────────────────────────────────────────────────────────────────────────────

#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn record_order(a: &ScenarioTriageRecord, b: &ScenarioTriageRecord) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.category.as_str().cmp(b.category.as_str()))
        .then_with(|| a.scenario.cmp(&b.scenario))
}

/// Confidence descending, then category name, then scenario name.
pub fn sort_records(records: &mut [ScenarioTriageRecord]) {
    records.sort_by(record_order);
}
