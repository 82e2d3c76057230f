//! Triage for failed Cucumber + Playwright end-to-end runs.
//!
//! The pipeline streams a Cucumber JSON report, extracts failing steps up to a
//! cap, groups them per scenario, classifies each scenario into a root-cause
//! category with evidence and a bounded confidence, and emits a stable
//! fingerprint, remediation hints and a Jira ticket draft per scenario.

#![forbid(unsafe_code)]

pub mod artifacts;
pub mod classify;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod html_report;
pub mod model;
pub mod remediation;
pub mod report_stream;
pub mod run_record;
pub mod table;
pub mod ticket;
pub mod triage;

pub use error::{Error, Result};
