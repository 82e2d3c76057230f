//! Machine-readable record of one triage run.

use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{RootCauseCategory, RunContext, ScenarioTriageRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub timestamp_iso: String,
    pub context: RunContext,
    pub results: Vec<RunRecordResult>,
}

/// Slim per-scenario row; evidence and ticket drafts are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecordResult {
    pub fingerprint: String,
    pub feature: String,
    pub scenario: String,
    pub category: RootCauseCategory,
    pub confidence: f64,
    pub top_error: String,
    pub location: String,
}

impl From<&ScenarioTriageRecord> for RunRecordResult {
    fn from(record: &ScenarioTriageRecord) -> Self {
        Self {
            fingerprint: record.fingerprint.clone(),
            feature: record.feature.clone(),
            scenario: record.scenario.clone(),
            category: record.category,
            confidence: record.confidence,
            top_error: record.top_error.clone(),
            location: record.location.clone(),
        }
    }
}

impl RunRecord {
    #[must_use]
    pub fn new(
        timestamp_iso: impl Into<String>,
        context: &RunContext,
        records: &[ScenarioTriageRecord],
    ) -> Self {
        Self {
            timestamp_iso: timestamp_iso.into(),
            context: context.clone(),
            results: records.iter().map(RunRecordResult::from).collect(),
        }
    }
}

/// Write a pretty-printed [`RunRecord`] stamped with the current UTC time.
pub fn write_run_record(
    path: &Path,
    context: &RunContext,
    records: &[ScenarioTriageRecord],
) -> Result<()> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let record = RunRecord::new(now, context, records);
    let json = serde_json::to_string_pretty(&record)?;
    fs::write(path, json)?;
    tracing::debug!(path = %path.display(), results = record.results.len(), "Wrote run record");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TicketDraft;
    use serde_json::Value;

    fn record() -> ScenarioTriageRecord {
        ScenarioTriageRecord {
            feature: "Login".into(),
            scenario: "valid user".into(),
            step: "When I submit".into(),
            location: "features/login.feature:7".into(),
            category: RootCauseCategory::Infra,
            confidence: 0.64,
            fingerprint: "feedfacecafebeef".into(),
            top_error: "net::ERR_CONNECTION_REFUSED".into(),
            evidence: Vec::new(),
            suggested_fix: vec!["Retry".into()],
            jira_draft: TicketDraft {
                project_key: "E2E".into(),
                issue_type: "Bug".into(),
                summary: String::new(),
                description: String::new(),
                labels: Vec::new(),
                components: Vec::new(),
                priority: "Medium".into(),
            },
        }
    }

    #[test]
    fn serializes_camel_case_shape() {
        let ctx = RunContext {
            commit_sha: Some("abc".into()),
            ..RunContext::default()
        };
        let run = RunRecord::new("2026-01-01T00:00:00.000Z", &ctx, &[record()]);
        let value = serde_json::to_value(&run).unwrap();
        assert_eq!(value["timestampIso"], "2026-01-01T00:00:00.000Z");
        assert_eq!(value["context"]["commitSha"], "abc");
        assert_eq!(value["results"][0]["category"], "INFRA");
        assert_eq!(value["results"][0]["topError"], "net::ERR_CONNECTION_REFUSED");
        assert!(value["results"][0].get("jiraDraft").is_none());
    }

    #[test]
    fn writes_pretty_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        write_run_record(&path, &RunContext::default(), &[record()]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"results\""));
        let value: Value = serde_json::from_str(&text).unwrap();
        let stamp = value["timestampIso"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
        assert_eq!(value["results"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn write_fails_for_missing_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("run.json");
        assert!(write_run_record(&path, &RunContext::default(), &[]).is_err());
    }
}
