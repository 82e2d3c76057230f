//! Category-level remediation suggestions.
//!
//! Suggestions are policy per category. They do not look at the failure
//! text, so two scenarios in the same category always get the same list.

use crate::model::RootCauseCategory;

const PERFORMANCE_TIMEOUT: &[&str] = &[
    "Use trace/timestamps to identify the slowest step; wait on a stable UI state (locator visible/enabled) rather than fixed sleeps.",
    "Prefer expect-based waits and correct navigation/load-state synchronization (e.g., await navigation, network idle where appropriate).",
    "If a downstream API is slow, isolate it in setup or add a lightweight health check to fail fast with a clear message.",
];

const ENV_DEPENDENCY: &[&str] = &[
    "Confirm environment health (5xx/DNS/timeouts) and baseURL availability; check dependent service status.",
    "Add dependency health checks (fail fast) and route incidents to the owning service when environment is down.",
    "If transient errors are expected, add retry/backoff at the dependency boundary (not at UI assertions).",
];

const INFRA: &[&str] = &[
    "Check CI runner stability (memory/disk/CPU); reduce parallelism or shard differently if resources are constrained.",
    "Ensure Playwright + browser versions are pinned/consistent in CI; capture additional logs around crashes/disconnects.",
    "If browser disconnects frequently, consider reducing video/trace overhead or increasing runner resources.",
];

const DATA_STATE: &[&str] = &[
    "Make test data unique per run and ensure teardown is idempotent; avoid shared mutable accounts/state.",
    "Refresh auth/session state reliably; avoid long-lived cookies or cross-test contamination.",
    "Add explicit cleanup for created entities and validate preconditions in setup.",
];

const TEST_BUG: &[&str] = &[
    "Harden locators: prefer getByRole/getByTestId; avoid brittle nth-child/text-only selectors.",
    "Remove arbitrary waits; wait for explicit UI states (visible/enabled) before actions and assertions.",
    "Fix undefined/ambiguous Cucumber steps by consolidating step definitions and improving match specificity.",
];

const FLAKE: &[&str] = &[
    "Rerun to confirm intermittency; if it passes, track fingerprint frequency and prioritize top flaky tests.",
    "Improve synchronization around animations/transitions; eliminate races between navigation and assertions.",
    "Record and trend flakes by fingerprint over 7 days to guide stabilization work.",
];

const PRODUCT_REGRESSION: &[&str] = &[
    "Validate expected behavior/requirements against recent changes in the affected area; confirm determinism by rerunning locally.",
    "If requirements changed intentionally, update assertions; otherwise file a regression with trace + exact repro steps.",
    "Add targeted assertions/logging around the first divergent step to speed debugging.",
];

const FALLBACK: &[&str] = &[
    "Open the trace (if available) and identify the first divergent step; capture full error + console output.",
    "Rerun once to help separate flake from deterministic regression, then escalate with artifacts.",
    "Add targeted logging around the failing step (requests/responses, UI state) to improve signal next time.",
];

/// Ordered remediation actions for a category.
#[must_use]
pub const fn suggested_actions(category: RootCauseCategory) -> &'static [&'static str] {
    match category {
        RootCauseCategory::PerformanceTimeout => PERFORMANCE_TIMEOUT,
        RootCauseCategory::EnvDependency => ENV_DEPENDENCY,
        RootCauseCategory::Infra => INFRA,
        RootCauseCategory::DataState => DATA_STATE,
        RootCauseCategory::TestBug => TEST_BUG,
        RootCauseCategory::Flake => FLAKE,
        RootCauseCategory::ProductRegression => PRODUCT_REGRESSION,
        RootCauseCategory::Unknown => FALLBACK,
    }
}

/// Owned suggestion list for a triage record. `_blob` is accepted for call-site
/// symmetry with the classifier and deliberately ignored.
#[must_use]
pub fn suggest_fixes(category: RootCauseCategory, _blob: &str) -> Vec<String> {
    suggested_actions(category)
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}
