//! Run configuration: failure cap and ticket-draft defaults.

use std::num::NonZeroUsize;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_FAILURES: usize = 500;
pub const DEFAULT_JIRA_PROJECT: &str = "E2E";
pub const DEFAULT_JIRA_ISSUE_TYPE: &str = "Bug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageConfig {
    /// Stop extracting once this many raw failing steps have been seen.
    pub max_failures: NonZeroUsize,
    pub jira_project_key: String,
    pub jira_issue_type: String,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            max_failures: NonZeroUsize::new(DEFAULT_MAX_FAILURES).unwrap_or(NonZeroUsize::MIN),
            jira_project_key: DEFAULT_JIRA_PROJECT.to_string(),
            jira_issue_type: DEFAULT_JIRA_ISSUE_TYPE.to_string(),
        }
    }
}

impl TriageConfig {
    /// Build a config from raw option strings, validating the cap first.
    pub fn from_options(
        max_failures: &str,
        jira_project_key: impl Into<String>,
        jira_issue_type: impl Into<String>,
    ) -> Result<Self> {
        let max_failures = parse_max_failures(max_failures)?;
        let jira_project_key = jira_project_key.into();
        if jira_project_key.trim().is_empty() {
            return Err(Error::validation("Jira project key must not be empty."));
        }
        Ok(Self {
            max_failures,
            jira_project_key,
            jira_issue_type: jira_issue_type.into(),
        })
    }
}

/// Parse the `--max-failures` option.
///
/// Only plain positive decimal integers are accepted; `0`, negatives,
/// fractions and anything non-numeric are rejected.
pub fn parse_max_failures(raw: &str) -> Result<NonZeroUsize> {
    let trimmed = raw.trim();
    let invalid = || {
        Error::config(format!(
            "Invalid --max-failures value \"{raw}\". Provide a positive integer."
        ))
    };
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    trimmed
        .parse::<usize>()
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(invalid)
}
