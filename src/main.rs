#![forbid(unsafe_code)]

//! CLI binary: triage failed scenarios from a Cucumber JSON report produced by
//! a Playwright-driven end-to-end run.
//!
//! Usage:
//! ```text
//! pw-triage \
//!   --cucumber-json reports/cucumber.json \
//!   --console reports/console.log \
//!   --artifacts test-results \
//!   --out triage-run.json \
//!   --html triage-report.html
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use triage::artifacts::index_artifacts;
use triage::config::{DEFAULT_JIRA_ISSUE_TYPE, DEFAULT_JIRA_PROJECT, TriageConfig};
use triage::html_report::write_html_report;
use triage::model::{RootCauseCategory, RunContext, ScenarioTriageRecord, TicketDraft};
use triage::report_stream::extract_failures;
use triage::run_record::write_run_record;
use triage::table::{
    DETAIL_COLUMNS, SUMMARY_COLUMNS, category_summary_rows, detail_rows, render_table,
};
use triage::ticket::percent;
use triage::triage::{TriageInput, triage_failures_per_scenario};

const FIX_PREVIEW_LIMIT: usize = 15;

#[derive(Debug, Parser)]
#[command(name = "pw-triage")]
#[command(about = "Triage Playwright + Cucumber failures into root-cause categories and Jira drafts")]
struct Args {
    /// Path to the Cucumber JSON report.
    #[arg(long)]
    cucumber_json: PathBuf,

    /// Optional console log captured during the run.
    #[arg(long)]
    console: Option<PathBuf>,

    /// Optional directory with screenshots, traces and videos.
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Stop after this many failing steps (positive integer).
    #[arg(long, env = "PW_TRIAGE_MAX_FAILURES", default_value = "500")]
    max_failures: String,

    /// Repository name (e.g. org/repo).
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repo: Option<String>,

    /// CI workflow run URL.
    #[arg(long)]
    workflow_url: Option<String>,

    /// Commit SHA under test.
    #[arg(long, env = "GITHUB_SHA")]
    commit: Option<String>,

    /// Branch under test.
    #[arg(long, env = "GITHUB_REF_NAME")]
    branch: Option<String>,

    /// Pull request number.
    #[arg(long)]
    pr: Option<String>,

    /// Target environment name (e.g. staging).
    #[arg(long)]
    env: Option<String>,

    /// Base URL of the system under test.
    #[arg(long)]
    base_url: Option<String>,

    /// Jira project key for drafts.
    #[arg(long, env = "PW_TRIAGE_JIRA_PROJECT", default_value = DEFAULT_JIRA_PROJECT)]
    jira_project: String,

    /// Jira issue type for drafts.
    #[arg(long, env = "PW_TRIAGE_JIRA_TYPE", default_value = DEFAULT_JIRA_ISSUE_TYPE)]
    jira_type: String,

    /// Record human approval intent. Drafts are still never submitted.
    #[arg(long)]
    approve: bool,

    /// Output path for the JSON run record.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output path for the HTML report.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn run_context(&self) -> RunContext {
        RunContext {
            repo: self.repo.clone(),
            workflow_url: self.workflow_url.clone(),
            commit_sha: self.commit.clone(),
            branch: self.branch.clone(),
            pr_number: self.pr.clone(),
            environment: self.env.clone(),
            base_url: self.base_url.clone(),
            ..RunContext::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DraftPreview<'a> {
    fingerprint: &'a str,
    category: RootCauseCategory,
    confidence: f64,
    jira_draft: &'a TicketDraft,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_console_log(path: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    // Non-UTF-8 bytes are replaced rather than rejected.
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::warn!("Console log not found, continuing without it: {}", path.display());
            Ok(None)
        }
        Err(err) => {
            Err(err).with_context(|| format!("reading console log from {}", path.display()))
        }
    }
}

fn display_path(path: &Path) -> String {
    fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn print_report(records: &[ScenarioTriageRecord]) -> Result<()> {
    println!("\n=== Failure Categories (Summary) ===");
    println!(
        "{}",
        render_table(&category_summary_rows(records), &SUMMARY_COLUMNS)
    );

    println!("\n=== Failed Scenarios (Details) ===");
    println!("{}", render_table(&detail_rows(records), &DETAIL_COLUMNS));

    println!("\n=== Suggested Fixes (Top 1 per scenario) ===");
    for r in records.iter().take(FIX_PREVIEW_LIMIT) {
        println!(
            "- [{} {}%] {} › {}: {}",
            r.category,
            percent(r.confidence),
            r.feature,
            r.scenario,
            r.suggested_fix.first().map_or("", String::as_str)
        );
    }

    println!("\n=== Jira Drafts (JSON) ===");
    let drafts: Vec<DraftPreview<'_>> = records
        .iter()
        .map(|r| DraftPreview {
            fingerprint: &r.fingerprint,
            category: r.category,
            confidence: r.confidence,
            jira_draft: &r.jira_draft,
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&drafts).context("serializing ticket drafts")?
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = TriageConfig::from_options(&args.max_failures, &args.jira_project, &args.jira_type)?;
    if !args.cucumber_json.exists() {
        return Err(triage::Error::not_found(&args.cucumber_json).into());
    }

    let console_log = read_console_log(args.console.as_deref())?;
    let artifacts = index_artifacts(args.artifacts.as_deref());
    let extraction = extract_failures(&args.cucumber_json, config.max_failures)?;
    if extraction.stopped_early {
        eprintln!(
            "Reached --max-failures={}; remaining report content was not read.",
            config.max_failures
        );
    }

    if extraction.failures.is_empty() {
        println!("No failed scenarios found in cucumber JSON.");
        return Ok(());
    }

    let context = args.run_context();
    let records = triage_failures_per_scenario(&TriageInput {
        failures: &extraction.failures,
        run_failure_count: extraction.failures.len(),
        console_log: console_log.as_deref(),
        context: &context,
        jira_project_key: &config.jira_project_key,
        jira_issue_type: &config.jira_issue_type,
        artifacts: &artifacts,
    });

    print_report(&records)?;

    if let Some(out) = &args.out {
        write_run_record(out, &context, &records)
            .with_context(|| format!("writing run record to {}", out.display()))?;
        println!("\nWrote eval run record: {}", display_path(out));
    }
    if let Some(html) = &args.html {
        write_html_report(html, &records, &context)
            .with_context(|| format!("writing HTML report to {}", html.display()))?;
        println!("Wrote HTML report: {}", display_path(html));
    }

    if args.approve {
        println!(
            "\nApproved: submission requested, but only drafts are produced. No tickets were submitted."
        );
    } else {
        println!(
            "\nApproval gate: NOT approved. No tickets submitted (drafts only). Re-run with --approve to indicate approval intent."
        );
    }
    Ok(())
}
