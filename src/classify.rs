//! Root-cause classification of failure evidence.
//!
//! A linear, additive scoring model: every rule in [`pattern_rules`] whose
//! regex matches the text adds its weight to one category and records an
//! evidence item. Two derived heuristics (run volume, pure expectation
//! mismatch) nudge the scores, then the winner's confidence is computed from
//! its absolute score and its lead over the runner-up.
//!
//! Confidence is a separation score, not a probability.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::model::{Classification, Evidence, EvidenceKind, RootCauseCategory};

/// Runs with at least this many failures get the env/infra volume boost.
pub const VOLUME_THRESHOLD: usize = 8;
pub const VOLUME_BOOST: f64 = 0.15;
pub const REGRESSION_BIAS: f64 = 0.2;
/// Below this rule score nothing meaningful matched.
pub const MIN_SIGNAL: f64 = 0.15;
pub const UNKNOWN_CONFIDENCE: f64 = 0.3;
pub const ASSERTION_DOWNGRADE: f64 = 0.1;

const EXPECTATION_MISMATCH: &str =
    r"expected.+(to equal|to be|to contain)|received:.+expected:|assertionerror|expect\(received\)\.";
const LOCATOR_BRITTLENESS: &str =
    r"strict mode violation|locator\(.+\) resolved to \d+ elements|Element is not attached|not visible|toBeVisible";
const ASSERTION_WORDING: &str = r"Expected.*to equal|toContainText|toHaveText";
const STRICT_LOCATOR: &str = r"strict mode violation|locator\(.+\) resolved to \d+ elements";

struct RuleDef {
    category: RootCauseCategory,
    weight: f64,
    pattern: &'static str,
    kind: EvidenceKind,
    note: &'static str,
}

const RULE_TABLE: &[RuleDef] = &[
    RuleDef {
        category: RootCauseCategory::EnvDependency,
        weight: 0.35,
        pattern: r"\b(503|502|504)\b|ECONNRESET|ETIMEDOUT|EAI_AGAIN|ENOTFOUND|DNS",
        kind: EvidenceKind::Console,
        note: "Network/dependency error pattern",
    },
    RuleDef {
        category: RootCauseCategory::EnvDependency,
        weight: 0.25,
        pattern: r"\b(timeout|timed out)\b.*\b(connect|request|response)\b",
        kind: EvidenceKind::Console,
        note: "Request/connect timeout pattern",
    },
    RuleDef {
        category: RootCauseCategory::Infra,
        weight: 0.35,
        pattern: r"browser has disconnected|Target closed|Protocol error|crash|Out of memory|ENOMEM",
        kind: EvidenceKind::Stack,
        note: "Runner/browser instability pattern",
    },
    RuleDef {
        category: RootCauseCategory::PerformanceTimeout,
        weight: 0.40,
        pattern: r"Timeout\s*\d*ms exceeded|Test timeout of \d+ms exceeded|waiting for .* timed out",
        kind: EvidenceKind::Stack,
        note: "Timeout signature",
    },
    RuleDef {
        category: RootCauseCategory::TestBug,
        weight: 0.40,
        pattern: LOCATOR_BRITTLENESS,
        kind: EvidenceKind::Stack,
        note: "Locator/visibility/assertion brittleness signature",
    },
    RuleDef {
        category: RootCauseCategory::ProductRegression,
        weight: 0.30,
        pattern: EXPECTATION_MISMATCH,
        kind: EvidenceKind::Stack,
        note: "Assertion mismatch pattern",
    },
    RuleDef {
        category: RootCauseCategory::Flake,
        weight: 0.30,
        pattern: r"\b(flaky|intermittent|transient)\b|retry(?:ing| #?\d+)",
        kind: EvidenceKind::Console,
        note: "Flake/retry signature",
    },
    RuleDef {
        category: RootCauseCategory::DataState,
        weight: 0.35,
        pattern: r"already exists|duplicate key|conflict|invalid state|not authorized|401|403",
        kind: EvidenceKind::Console,
        note: "Auth/data/state pattern",
    },
    RuleDef {
        category: RootCauseCategory::TestBug,
        weight: 0.35,
        pattern: r"Undefined\. Implement with the following snippet|Ambiguous match found",
        kind: EvidenceKind::Report,
        note: "Undefined/ambiguous Cucumber step definition",
    },
];

/// One compiled scoring rule.
#[derive(Debug)]
pub struct PatternRule {
    pub category: RootCauseCategory,
    pub weight: f64,
    pub kind: EvidenceKind,
    pub note: &'static str,
    pub regex: Regex,
}

impl PatternRule {
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Evidence item naming the rule and its pattern, for auditability.
    #[must_use]
    pub fn evidence(&self) -> Evidence {
        Evidence::new(self.kind, format!("{} (/{}/i)", self.note, self.regex.as_str()))
    }
}

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("classifier pattern must compile")
}

/// The fixed, ordered rule table, compiled once per process.
pub fn pattern_rules() -> &'static [PatternRule] {
    static RULES: OnceLock<Vec<PatternRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        RULE_TABLE
            .iter()
            .map(|def| PatternRule {
                category: def.category,
                weight: def.weight,
                kind: def.kind,
                note: def.note,
                regex: case_insensitive(def.pattern),
            })
            .collect()
    })
}

struct Guards {
    expectation_mismatch: Regex,
    locator_brittleness: Regex,
    assertion_wording: Regex,
    strict_locator: Regex,
}

fn guards() -> &'static Guards {
    static GUARDS: OnceLock<Guards> = OnceLock::new();
    GUARDS.get_or_init(|| Guards {
        expectation_mismatch: case_insensitive(EXPECTATION_MISMATCH),
        locator_brittleness: case_insensitive(LOCATOR_BRITTLENESS),
        assertion_wording: case_insensitive(ASSERTION_WORDING),
        strict_locator: case_insensitive(STRICT_LOCATOR),
    })
}

/// Per-category running scores.
#[derive(Debug, Clone, Default)]
struct ScoreCard([f64; RootCauseCategory::all().len()]);

impl ScoreCard {
    fn add(&mut self, category: RootCauseCategory, weight: f64) {
        self.0[category.index()] += weight;
    }

    fn max(&self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    /// Winner and runner-up score. Ties go to the earlier category.
    fn top_two(&self) -> (RootCauseCategory, f64, f64) {
        let mut top = RootCauseCategory::all()[0];
        let mut top_score = self.0[0];
        for &category in &RootCauseCategory::all()[1..] {
            let score = self.0[category.index()];
            if score > top_score {
                top = category;
                top_score = score;
            }
        }
        let second = RootCauseCategory::all()
            .iter()
            .filter(|&&c| c != top)
            .map(|c| self.0[c.index()])
            .fold(f64::NEG_INFINITY, f64::max);
        (top, top_score, second.max(0.0))
    }
}

#[must_use]
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Confidence from the winning score and its lead over the runner-up.
#[must_use]
pub fn separation_confidence(top_score: f64, gap: f64) -> f64 {
    clamp01(0.45f64.mul_add(top_score, 0.55 * clamp01(gap + 0.25)))
}

/// Classify a failure text blob.
///
/// `run_failure_count` is the number of failures in the whole run, used only
/// by the volume heuristic.
#[must_use]
pub fn classify_failure(text_blob: &str, run_failure_count: usize) -> Classification {
    let mut scores = ScoreCard::default();
    let mut evidence = Vec::new();

    for rule in pattern_rules() {
        if rule.matches(text_blob) {
            scores.add(rule.category, rule.weight);
            evidence.push(rule.evidence());
        }
    }

    if scores.max() < MIN_SIGNAL {
        return Classification {
            category: RootCauseCategory::Unknown,
            confidence: UNKNOWN_CONFIDENCE,
            evidence: vec![Evidence::new(
                EvidenceKind::Heuristic,
                "No strong pattern matched; needs human triage.",
            )],
        };
    }

    if run_failure_count >= VOLUME_THRESHOLD {
        scores.add(RootCauseCategory::EnvDependency, VOLUME_BOOST);
        scores.add(RootCauseCategory::Infra, VOLUME_BOOST);
        evidence.push(Evidence::new(
            EvidenceKind::Heuristic,
            format!(
                "Many failing scenarios in run ({run_failure_count}) suggests env/infra over isolated failures."
            ),
        ));
    }

    let guards = guards();
    let brittle_locator = guards.locator_brittleness.is_match(text_blob);
    if guards.expectation_mismatch.is_match(text_blob) && !brittle_locator {
        scores.add(RootCauseCategory::ProductRegression, REGRESSION_BIAS);
        evidence.push(Evidence::new(
            EvidenceKind::Heuristic,
            "Expectation mismatch without locator instability is often product behavior drift.",
        ));
    }

    let (category, top_score, second_score) = scores.top_two();
    let mut confidence = separation_confidence(top_score, top_score - second_score);
    tracing::trace!(
        category = %category,
        top_score,
        second_score,
        confidence,
        scores = ?scores.0,
        "Classified failure blob"
    );

    if category == RootCauseCategory::TestBug
        && guards.assertion_wording.is_match(text_blob)
        && !guards.strict_locator.is_match(text_blob)
    {
        evidence.push(Evidence::new(
            EvidenceKind::Heuristic,
            "Assertion mismatch could indicate a product regression; verify expected behavior vs recent changes.",
        ));
        confidence = clamp01(confidence - ASSERTION_DOWNGRADE);
    }

    Classification {
        category,
        confidence,
        evidence,
    }
}
