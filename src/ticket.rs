//! Jira ticket draft assembly.
//!
//! Pure formatting over already-computed triage fields. Drafts are printed
//! and persisted; nothing here talks to a ticketing service.

use crate::artifacts::ArtifactIndex;
use crate::model::{RootCauseCategory, RunContext, TicketDraft};

pub const HIGH_PRIORITY_CONFIDENCE: f64 = 0.85;
const MAX_ARTIFACTS_PER_KIND: usize = 5;

/// Inputs for a single draft.
#[derive(Debug, Clone, Copy)]
pub struct DraftRequest<'a> {
    pub project_key: &'a str,
    pub issue_type: &'a str,
    pub category: RootCauseCategory,
    pub confidence: f64,
    pub fingerprint: &'a str,
    pub feature: &'a str,
    pub scenario: &'a str,
    pub step: &'a str,
    pub location: &'a str,
    pub top_error_snippet: &'a str,
    pub suggested_fixes: &'a [String],
    pub context: &'a RunContext,
    pub artifacts: &'a ArtifactIndex,
}

#[must_use]
pub fn percent(confidence: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let pct = (confidence * 100.0).round() as i64;
    pct
}

#[must_use]
pub fn build_ticket_draft(req: &DraftRequest<'_>) -> TicketDraft {
    let pct = percent(req.confidence);
    let summary = format!(
        "[E2E][Cucumber][Playwright] {} ({pct}%) • {} • {}",
        req.category, req.scenario, req.fingerprint
    );

    let mut lines = vec![
        "h2. Automated Triage".to_string(),
        format!("*Category:* {}", req.category),
        format!("*Confidence:* {pct}%"),
        format!("*Fingerprint:* {}", req.fingerprint),
        String::new(),
        "h2. Failure".to_string(),
        format!("- *Feature:* {}", req.feature),
        format!("- *Scenario:* {}", req.scenario),
    ];
    if !req.step.is_empty() {
        lines.push(format!("- *Step:* {}", req.step));
    }
    if !req.location.is_empty() {
        lines.push(format!("- *Location:* {}", req.location));
    }
    lines.push(String::new());
    if !req.top_error_snippet.is_empty() {
        lines.push(format!(
            "h2. Top Error\n{{code}}\n{}\n{{code}}\n",
            req.top_error_snippet
        ));
    }
    lines.push("h2. Suggested Fix".to_string());
    lines.extend(req.suggested_fixes.iter().map(|fix| format!("- {fix}")));
    lines.push(String::new());
    lines.push("h2. Run Context".to_string());
    lines.extend(context_lines(req.context));
    lines.push(String::new());

    let artifact_lines = artifact_lines(req.artifacts);
    if !artifact_lines.is_empty() {
        lines.push(format!("h2. Artifacts\n{}\n", artifact_lines.join("\n")));
    }

    // Blank separators are dropped, matching how the draft reads in Jira.
    let description = lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let labels = vec![
        "playwright".to_string(),
        "cucumber".to_string(),
        "e2e".to_string(),
        "triage-agent".to_string(),
        req.category.as_str().to_ascii_lowercase(),
        format!("fp-{}", req.fingerprint),
    ];

    let priority = if req.confidence >= HIGH_PRIORITY_CONFIDENCE {
        "High"
    } else {
        "Medium"
    };

    TicketDraft {
        project_key: req.project_key.to_string(),
        issue_type: req.issue_type.to_string(),
        summary,
        description,
        labels,
        components: Vec::new(),
        priority: priority.to_string(),
    }
}

fn context_lines(ctx: &RunContext) -> Vec<String> {
    [
        ("Repo", &ctx.repo),
        ("Branch", &ctx.branch),
        ("Commit", &ctx.commit_sha),
        ("PR", &ctx.pr_number),
        ("Env", &ctx.environment),
        ("Base URL", &ctx.base_url),
        ("CI Run", &ctx.workflow_url),
    ]
    .into_iter()
    .filter_map(|(label, value)| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| format!("- {label}: {v}"))
    })
    .collect()
}

fn artifact_lines(artifacts: &ArtifactIndex) -> Vec<String> {
    [
        ("Traces", &artifacts.traces),
        ("Screenshots", &artifacts.screenshots),
        ("Videos", &artifacts.videos),
    ]
    .into_iter()
    .filter(|(_, paths)| !paths.is_empty())
    .map(|(label, paths)| {
        let shown = paths
            .iter()
            .take(MAX_ARTIFACTS_PER_KIND)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let more = if paths.len() > MAX_ARTIFACTS_PER_KIND {
            " …"
        } else {
            ""
        };
        format!("- {label}: {shown}{more}")
    })
    .collect()
}
