//! Streaming extraction of failing steps from a Cucumber JSON report.
//!
//! Reports from large suites routinely run to tens of megabytes, so the
//! top-level array is consumed one feature at a time through
//! `serde_json::Deserializer::from_reader`: each feature object is fully
//! materialized before it is inspected, but never alongside its neighbours.
//!
//! Once `max_failures` raw sightings have been captured the read is abandoned
//! on the spot. That is a normal completion (`Extraction::stopped_early`),
//! not an error, and whatever follows in the stream is never looked at.
//! Deduplication runs afterwards on the captured prefix.

use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::path::Path;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub const UNKNOWN_SCENARIO: &str = "Unknown scenario";

/// Step outcomes that count as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStatus {
    Failed,
    Ambiguous,
    Undefined,
}

impl FailureStatus {
    /// Map a report status string to a failure status, if it is one.
    #[must_use]
    pub fn from_report_status(status: &str) -> Option<Self> {
        match status {
            "failed" => Some(Self::Failed),
            "ambiguous" => Some(Self::Ambiguous),
            "undefined" => Some(Self::Undefined),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::Ambiguous => "ambiguous",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for FailureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failing, ambiguous or undefined step occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStepFailure {
    pub feature_name: Option<String>,
    pub scenario_name: String,
    pub uri: Option<String>,
    pub line: Option<u64>,
    pub step_name: Option<String>,
    pub step_keyword: Option<String>,
    pub status: FailureStatus,
    pub duration_ns: Option<u64>,
    pub error_message: Option<String>,
}

impl RawStepFailure {
    /// First line of the error message, or `""`.
    #[must_use]
    pub fn first_error_line(&self) -> &str {
        self.error_message
            .as_deref()
            .and_then(|msg| msg.split('\n').next())
            .unwrap_or("")
    }

    /// Keyword and name joined the way they read in the feature file.
    #[must_use]
    pub fn step_label(&self) -> String {
        format!(
            "{}{}",
            self.step_keyword.as_deref().unwrap_or(""),
            self.step_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Deduplicated failures in first-seen order.
    pub failures: Vec<RawStepFailure>,
    /// Raw sightings before deduplication.
    pub raw_count: usize,
    pub features_seen: usize,
    /// The cap was reached and the rest of the stream was skipped.
    pub stopped_early: bool,
}

/// Extract failing steps from the report at `path`.
pub fn extract_failures(path: &Path, max_failures: NonZeroUsize) -> Result<Extraction> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::not_found(path));
        }
        Err(err) => return Err(err.into()),
    };
    tracing::debug!(
        path = %path.display(),
        max_failures = max_failures.get(),
        "Streaming cucumber report"
    );
    extract_failures_from_reader(BufReader::new(file), max_failures)
}

/// Extract failing steps from any byte stream holding a report.
pub fn extract_failures_from_reader<R: Read>(
    reader: R,
    max_failures: NonZeroUsize,
) -> Result<Extraction> {
    let mut sink = FailureSink::new(max_failures.get());
    let mut json = serde_json::Deserializer::from_reader(reader);
    let parsed = de::Deserializer::deserialize_seq(&mut json, FeatureSeqVisitor { sink: &mut sink });

    match parsed {
        // The unread tail makes serde_json complain about the unterminated
        // array; that is the cancellation path, not a malformed report.
        _ if sink.stopped_early => {
            tracing::info!(
                event = "report_stream.stopped_early",
                captured = sink.failures.len(),
                features_seen = sink.features_seen,
                "Failure cap reached; abandoning the rest of the report"
            );
        }
        Ok(()) => json
            .end()
            .map_err(|err| Error::parse(err.to_string()))?,
        Err(err) => return Err(Error::parse(err.to_string())),
    }

    let raw_count = sink.failures.len();
    let failures = dedupe_failures(sink.failures);
    tracing::debug!(
        raw_count,
        deduped = failures.len(),
        "Finished extracting failures"
    );
    Ok(Extraction {
        failures,
        raw_count,
        features_seen: sink.features_seen,
        stopped_early: sink.stopped_early,
    })
}

/// Collapse repeated sightings of the same step failure, keeping the first.
///
/// Identity is `(uri, line, scenario, step name, first error line)`.
#[must_use]
pub fn dedupe_failures(items: Vec<RawStepFailure>) -> Vec<RawStepFailure> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for failure in items {
        let key = (
            failure.uri.clone().unwrap_or_default(),
            failure.line,
            failure.scenario_name.clone(),
            failure.step_name.clone().unwrap_or_default(),
            failure.first_error_line().to_string(),
        );
        if seen.insert(key) {
            out.push(failure);
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Streaming internals
// ────────────────────────────────────────────────────────────────────────────

struct FailureSink {
    cap: usize,
    failures: Vec<RawStepFailure>,
    features_seen: usize,
    stopped_early: bool,
}

impl FailureSink {
    const fn new(cap: usize) -> Self {
        Self {
            cap,
            failures: Vec::new(),
            features_seen: 0,
            stopped_early: false,
        }
    }

    fn absorb_feature(&mut self, feature: &Value) -> ControlFlow<()> {
        self.features_seen += 1;
        let feature_name = str_field(feature, "name");
        let uri = str_field(feature, "uri").or_else(|| str_field(feature, "path"));

        let scenarios = array_field(feature, "elements")
            .or_else(|| array_field(feature, "scenarios"))
            .unwrap_or_default();

        for scenario in scenarios {
            let scenario_name = str_field(scenario, "name").unwrap_or(UNKNOWN_SCENARIO);
            let line = scenario.get("line").and_then(Value::as_u64);

            for step in array_field(scenario, "steps").unwrap_or_default() {
                let Some(failure) = step_failure(step) else {
                    continue;
                };
                self.failures.push(RawStepFailure {
                    feature_name: feature_name.map(str::to_string),
                    scenario_name: scenario_name.to_string(),
                    uri: uri.map(str::to_string),
                    line,
                    ..failure
                });
                if self.failures.len() >= self.cap {
                    self.stopped_early = true;
                    return ControlFlow::Break(());
                }
            }
        }
        ControlFlow::Continue(())
    }
}

/// Pull step-level failure fields; scenario/feature fields are left blank.
fn step_failure(step: &Value) -> Option<RawStepFailure> {
    let result = step
        .get("result")
        .filter(|v| !v.is_null())
        .or_else(|| step.get("match").and_then(|m| m.get("result")));
    let result_str = |key: &str| result.and_then(|r| str_field(r, key));

    let status = result_str("status")
        .or_else(|| str_field(step, "status"))
        .unwrap_or("unknown");
    let status = FailureStatus::from_report_status(status)?;

    let error_message = result_str("error_message")
        .or_else(|| str_field(step, "error_message"))
        .or_else(|| result_str("message"))
        .map(str::to_string);

    Some(RawStepFailure {
        feature_name: None,
        scenario_name: String::new(),
        uri: None,
        line: None,
        step_name: str_field(step, "name").map(str::to_string),
        step_keyword: str_field(step, "keyword").map(str::to_string),
        status,
        duration_ns: result.and_then(|r| r.get("duration")).and_then(duration_ns),
        error_message,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn duration_ns(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d as u64)
    })
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn array_field<'a>(value: &'a Value, key: &str) -> Option<&'a [Value]> {
    value.get(key).and_then(Value::as_array).map(Vec::as_slice)
}

struct FeatureSeqVisitor<'a> {
    sink: &'a mut FailureSink,
}

impl<'de> Visitor<'de> for FeatureSeqVisitor<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a top-level array of feature objects")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(feature) = seq.next_element::<Value>()? {
            if self.sink.absorb_feature(&feature).is_break() {
                break;
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
