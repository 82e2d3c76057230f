//! End-to-end tests that invoke the compiled `pw-triage` binary.

mod common;

use std::path::{Path, PathBuf};
use std::process::Command;

use common::{failing_step, feature, passing_step, scenario, write_json};
use serde_json::{Value, json};

const ISOLATED_ENV: &[&str] = &[
    "PW_TRIAGE_MAX_FAILURES",
    "PW_TRIAGE_JIRA_PROJECT",
    "PW_TRIAGE_JIRA_TYPE",
    "GITHUB_REPOSITORY",
    "GITHUB_REF_NAME",
    "GITHUB_SHA",
    "RUST_LOG",
];

struct CliResult {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

fn run_cli(cwd: &Path, args: &[&str]) -> CliResult {
    let mut command = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_pw-triage")));
    command.args(args).current_dir(cwd);
    for key in ISOLATED_ENV {
        command.env_remove(key);
    }
    let output = command.output().expect("run pw-triage");
    CliResult {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

fn failing_report() -> Value {
    json!([feature(
        "Checkout",
        "features/checkout.feature",
        vec![
            scenario(
                "pay with saved card",
                12,
                vec![failing_step(
                    "When ",
                    "I submit payment",
                    "TimeoutError: locator.click: Timeout 30000ms exceeded.",
                )],
            ),
            scenario(
                "apply coupon",
                20,
                vec![failing_step("Then ", "the total drops", "Coupon rejected")],
            ),
        ],
    )])
}

#[test]
fn invalid_cap_is_rejected_before_the_report_is_opened() {
    let dir = tempfile::tempdir().unwrap();
    let result = run_cli(
        dir.path(),
        &["--cucumber-json", "does-not-exist.json", "--max-failures", "0"],
    );
    assert_ne!(result.exit_code, 0);
    assert!(
        result
            .stderr
            .contains("Invalid --max-failures value \"0\". Provide a positive integer."),
        "stderr: {}",
        result.stderr
    );
    assert!(!result.stderr.contains("Cucumber JSON not found"));
}

#[test]
fn missing_report_fails_with_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let result = run_cli(dir.path(), &["--cucumber-json", "does-not-exist.json"]);
    assert_ne!(result.exit_code, 0);
    assert!(
        result.stderr.contains("Cucumber JSON not found: does-not-exist.json"),
        "stderr: {}",
        result.stderr
    );
    assert!(result.stdout.is_empty());
}

#[test]
fn passing_report_prints_no_failures_message() {
    let dir = tempfile::tempdir().unwrap();
    let report = json!([feature(
        "Login",
        "features/login.feature",
        vec![scenario("sign in", 3, vec![passing_step("Given ", "I am on the login page")])],
    )]);
    write_json(dir.path(), "cucumber.json", &report);

    let result = run_cli(dir.path(), &["--cucumber-json", "cucumber.json"]);
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert_eq!(result.stdout.trim(), "No failed scenarios found in cucumber JSON.");
}

#[test]
fn failing_report_writes_outputs_and_tolerates_binary_console_bytes() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "cucumber.json", &failing_report());
    std::fs::write(dir.path().join("console.log"), b"ok line\n\xff\xfe garbage boom\n").unwrap();

    let result = run_cli(
        dir.path(),
        &[
            "--cucumber-json",
            "cucumber.json",
            "--console",
            "console.log",
            "--repo",
            "org/web",
            "--jira-project",
            "QA",
            "--out",
            "run.json",
            "--html",
            "report.html",
        ],
    );
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);

    let stdout = &result.stdout;
    assert!(stdout.contains("=== Failure Categories (Summary) ==="));
    assert!(stdout.contains("=== Failed Scenarios (Details) ==="));
    assert!(stdout.contains("=== Suggested Fixes (Top 1 per scenario) ==="));
    assert!(stdout.contains("PERFORMANCE_TIMEOUT"));
    assert!(stdout.contains("\"projectKey\": \"QA\""));
    assert!(stdout.contains("Wrote eval run record:"));
    assert!(stdout.contains("Wrote HTML report:"));
    assert!(stdout.contains("Approval gate: NOT approved."));

    let record: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("run.json")).unwrap())
            .unwrap();
    assert_eq!(record["context"]["repo"], "org/web");
    assert_eq!(record["results"].as_array().map(Vec::len), Some(2));

    let html = std::fs::read_to_string(dir.path().join("report.html")).unwrap();
    assert!(html.contains("pay with saved card"));
    assert!(html.contains("class=\"detail-row\""));
}

#[test]
fn approve_flag_changes_closing_message_only() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "cucumber.json", &failing_report());

    let result = run_cli(dir.path(), &["--cucumber-json", "cucumber.json", "--approve"]);
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert!(result.stdout.contains("Approved: submission requested"));
    assert!(!result.stdout.contains("Approval gate: NOT approved."));
}

#[test]
fn cap_reports_early_stop_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "cucumber.json", &failing_report());

    let result = run_cli(
        dir.path(),
        &["--cucumber-json", "cucumber.json", "--max-failures", "1"],
    );
    assert_eq!(result.exit_code, 0, "stderr: {}", result.stderr);
    assert!(result.stderr.contains("Reached --max-failures=1"));
    assert!(result.stdout.contains("pay with saved card"));
    assert!(!result.stdout.contains("apply coupon"));
}
