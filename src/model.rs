//! Shared data model for triage output.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Categories & evidence
// ────────────────────────────────────────────────────────────────────────────

/// Closed set of root-cause categories a failing scenario can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RootCauseCategory {
    ProductRegression,
    TestBug,
    Flake,
    EnvDependency,
    Infra,
    PerformanceTimeout,
    DataState,
    Unknown,
}

impl RootCauseCategory {
    /// All categories, in score-map order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ProductRegression,
            Self::TestBug,
            Self::Flake,
            Self::EnvDependency,
            Self::Infra,
            Self::PerformanceTimeout,
            Self::DataState,
            Self::Unknown,
        ]
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductRegression => "PRODUCT_REGRESSION",
            Self::TestBug => "TEST_BUG",
            Self::Flake => "FLAKE",
            Self::EnvDependency => "ENV_DEPENDENCY",
            Self::Infra => "INFRA",
            Self::PerformanceTimeout => "PERFORMANCE_TIMEOUT",
            Self::DataState => "DATA_STATE",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for RootCauseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a piece of evidence was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceKind {
    /// Stack trace / error message pattern.
    Stack,
    /// Console log pattern.
    Console,
    /// Report structure (undefined / ambiguous steps).
    Report,
    /// Trace artifact.
    Trace,
    /// Derived heuristic, not a direct textual match.
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub message: String,
}

impl Evidence {
    pub fn new(kind: EvidenceKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: RootCauseCategory,
    /// Heuristic separation-and-strength score in `[0, 1]`.
    pub confidence: f64,
    pub evidence: Vec<Evidence>,
}

// ────────────────────────────────────────────────────────────────────────────
// Run context & output records
// ────────────────────────────────────────────────────────────────────────────

/// CI metadata attached to every ticket draft. Never influences classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// Ticket draft payload. Drafts are never submitted anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    pub project_key: String,
    pub issue_type: String,
    pub summary: String,
    pub description: String,
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    pub priority: String,
}

/// One triaged failing scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioTriageRecord {
    pub feature: String,
    pub scenario: String,
    pub step: String,
    pub location: String,
    pub category: RootCauseCategory,
    pub confidence: f64,
    pub fingerprint: String,
    pub top_error: String,
    pub evidence: Vec<Evidence>,
    pub suggested_fix: Vec<String>,
    pub jira_draft: TicketDraft,
}
