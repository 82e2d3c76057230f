mod common;

use common::{cap, failing_step, feature, passing_step, scenario, write_json};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use triage::artifacts::ArtifactIndex;
use triage::html_report::write_html_report;
use triage::model::{EvidenceKind, RootCauseCategory, RunContext, ScenarioTriageRecord};
use triage::report_stream::{Extraction, extract_failures};
use triage::run_record::write_run_record;
use triage::triage::{TriageInput, triage_failures_per_scenario};

fn extract(report: &Value) -> Extraction {
    let dir = tempfile::tempdir().unwrap();
    let path = write_json(dir.path(), "cucumber.json", report);
    extract_failures(&path, cap(500)).unwrap()
}

fn run(
    extraction: &Extraction,
    console_log: Option<&str>,
    context: &RunContext,
    artifacts: &ArtifactIndex,
) -> Vec<ScenarioTriageRecord> {
    triage_failures_per_scenario(&TriageInput {
        failures: &extraction.failures,
        run_failure_count: extraction.failures.len(),
        console_log,
        context,
        jira_project_key: "QA",
        jira_issue_type: "Bug",
        artifacts,
    })
}

fn two_feature_report() -> Value {
    json!([
        feature(
            "Checkout",
            "features/checkout.feature",
            vec![scenario(
                "pay with saved card",
                12,
                vec![
                    passing_step("Given ", "a cart with one item"),
                    failing_step(
                        "When ",
                        "I submit payment",
                        "TimeoutError: locator.click: Timeout 30000ms exceeded.",
                    ),
                ],
            )],
        ),
        feature(
            "Login",
            "features/login.feature",
            vec![scenario(
                "sign in with valid user",
                7,
                vec![failing_step(
                    "Then ",
                    "I see the dashboard",
                    "Error: expect(received).toBe(expected)\n\nExpected: \"Dashboard\"\nReceived: \"Sign in\"",
                )],
            )],
        ),
    ])
}

#[test]
fn triages_each_failing_scenario() {
    let extraction = extract(&two_feature_report());
    let context = RunContext {
        repo: Some("org/web".into()),
        branch: Some("main".into()),
        ..RunContext::default()
    };
    let records = run(&extraction, None, &context, &ArtifactIndex::default());

    let summary: Vec<(&str, RootCauseCategory)> = records
        .iter()
        .map(|r| (r.scenario.as_str(), r.category))
        .collect();
    assert_eq!(
        summary,
        [
            ("sign in with valid user", RootCauseCategory::ProductRegression),
            ("pay with saved card", RootCauseCategory::PerformanceTimeout),
        ]
    );
    assert!(records[0].confidence > records[1].confidence);

    let checkout = &records[1];
    assert_eq!(checkout.feature, "Checkout");
    assert_eq!(checkout.step, "When I submit payment");
    assert_eq!(checkout.location, "features/checkout.feature:12");
    assert_eq!(
        checkout.top_error,
        "TimeoutError: locator.click: Timeout 30000ms exceeded."
    );
    assert_eq!(checkout.fingerprint.len(), 16);
    assert!(!checkout.suggested_fix.is_empty());

    let draft = &checkout.jira_draft;
    assert_eq!(draft.project_key, "QA");
    assert!(draft.summary.contains("PERFORMANCE_TIMEOUT"));
    assert!(draft.description.contains("- Repo: org/web\n- Branch: main"));
    assert!(draft.labels.contains(&format!("fp-{}", checkout.fingerprint)));

    let login = &records[0];
    assert!(
        login
            .evidence
            .iter()
            .any(|e| e.kind == EvidenceKind::Heuristic && e.message.contains("product behavior drift"))
    );
}

#[test]
fn triage_is_deterministic() {
    let extraction = extract(&two_feature_report());
    let context = RunContext::default();
    let artifacts = ArtifactIndex::default();
    let first = run(&extraction, None, &context, &artifacts);
    let second = run(&extraction, None, &context, &artifacts);
    assert_eq!(first, second);
}

#[test]
fn steps_of_one_scenario_make_one_record() {
    let report = json!([feature(
        "Profile",
        "features/profile.feature",
        vec![scenario(
            "update avatar",
            5,
            vec![
                failing_step("When ", "I upload a picture", "Upload failed"),
                failing_step("After ", "cleanup", "Cleanup failed"),
            ],
        )],
    )]);
    let extraction = extract(&report);
    assert_eq!(extraction.failures.len(), 2);

    let records = run(&extraction, None, &RunContext::default(), &ArtifactIndex::default());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].step, "When I upload a picture");
    assert_eq!(records[0].top_error, "Upload failed");
    assert_eq!(records[0].category, RootCauseCategory::Unknown);
}

#[test]
fn correlated_console_lines_feed_classification() {
    let report = json!([feature(
        "Orders",
        "features/orders.feature",
        vec![scenario(
            "load order history",
            30,
            vec![failing_step("When ", "I open my orders", "page.goto: net::ERR_ABORTED")],
        )],
    )]);
    let extraction = extract(&report);
    let console = "[ui] boot complete\n[api] GET /api/orders/history 503 Service Unavailable\n[ui] banner rendered\n";

    let without = run(&extraction, None, &RunContext::default(), &ArtifactIndex::default());
    assert_eq!(without[0].category, RootCauseCategory::Unknown);

    let with = run(
        &extraction,
        Some(console),
        &RunContext::default(),
        &ArtifactIndex::default(),
    );
    assert_eq!(with[0].category, RootCauseCategory::EnvDependency);
    assert!(with[0].evidence.iter().any(|e| e.kind == EvidenceKind::Console));
}

#[test]
fn run_wide_failure_volume_adds_env_infra_evidence() {
    let scenarios = |n: usize| -> Value {
        let elements: Vec<Value> = (0..n)
            .map(|i| {
                scenario(
                    &format!("scenario {i}"),
                    10 + i as u64,
                    vec![failing_step("When ", "I wait", "Timeout 5000ms exceeded.")],
                )
            })
            .collect();
        json!([feature("Dashboard", "features/dashboard.feature", elements)])
    };

    let below = run(
        &extract(&scenarios(7)),
        None,
        &RunContext::default(),
        &ArtifactIndex::default(),
    );
    let above = run(
        &extract(&scenarios(8)),
        None,
        &RunContext::default(),
        &ArtifactIndex::default(),
    );

    assert!(below.iter().all(|r| r.category == RootCauseCategory::PerformanceTimeout));
    assert!(above.iter().all(|r| r.category == RootCauseCategory::PerformanceTimeout));
    assert!(above[0].confidence < below[0].confidence);
    assert!(
        above[0]
            .evidence
            .iter()
            .any(|e| e.message.contains("Many failing scenarios in run (8)"))
    );
    assert!(
        !below[0]
            .evidence
            .iter()
            .any(|e| e.message.starts_with("Many failing scenarios"))
    );

    let order: Vec<&str> = above.iter().map(|r| r.scenario.as_str()).collect();
    let expected: Vec<String> = (0..8).map(|i| format!("scenario {i}")).collect();
    assert_eq!(order, expected);
}

#[test]
fn artifacts_are_listed_in_drafts() {
    let extraction = extract(&two_feature_report());
    let artifacts = ArtifactIndex::from_paths(["out/checkout/trace.zip", "out/checkout/failed.png"]);
    let records = run(&extraction, None, &RunContext::default(), &artifacts);
    for record in &records {
        let d = &record.jira_draft.description;
        assert!(d.contains("- Traces: out/checkout/trace.zip"));
        assert!(d.contains("- Screenshots: out/checkout/failed.png"));
    }
}

#[test]
fn writes_run_record_and_html_report() {
    let dir = tempfile::tempdir().unwrap();
    let extraction = extract(&two_feature_report());
    let context = RunContext {
        environment: Some("staging".into()),
        ..RunContext::default()
    };
    let records = run(&extraction, None, &context, &ArtifactIndex::default());

    let record_path = dir.path().join("run.json");
    write_run_record(&record_path, &context, &records).unwrap();
    let value: Value = serde_json::from_str(&std::fs::read_to_string(&record_path).unwrap()).unwrap();
    assert_eq!(value["context"]["environment"], "staging");
    let fingerprints: Vec<&str> = value["results"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["fingerprint"].as_str())
        .collect();
    let expected: Vec<&str> = records.iter().map(|r| r.fingerprint.as_str()).collect();
    assert_eq!(fingerprints, expected);

    let html_path = dir.path().join("report.html");
    write_html_report(&html_path, &records, &context).unwrap();
    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("Failed Scenario Details"));
    assert!(html.contains("pay with saved card"));
    assert!(html.contains("<tr><th>Environment</th><td>staging</td></tr>"));
}
