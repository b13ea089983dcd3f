//! # Result Export Module
//!
//! Read-only views over a finished [`RunResult`]: the one-row-per-issue
//! CSV export and the JSON-friendly run summary.
//!
//! Export order is the run's own order, so two runs over identical
//! inputs and configuration export byte-identical output.

use crate::pipeline::{RunResult, TerminationReason};
use crate::types::{Issue, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column header of the issue CSV export.
pub const ISSUES_CSV_HEADER: &str = "person_id,severity,issue_type,message";

// =============================================================================
// ISSUE CSV
// =============================================================================

/// Render issues as CSV, one row per issue plus the header row.
///
/// Rows keep the input order. Fields containing commas or quotes are
/// quoted per RFC 4180; messages are single-line by construction, so a
/// row never spans lines.
#[must_use]
pub fn issues_to_csv(issues: &[Issue]) -> String {
    let mut out = String::with_capacity(64 + issues.len() * 80);
    out.push_str(ISSUES_CSV_HEADER);
    out.push('\n');
    for issue in issues {
        out.push_str(&csv_field(issue.person_id.as_str()));
        out.push(',');
        out.push_str(issue.severity.as_str());
        out.push(',');
        out.push_str(&csv_field(&issue.issue_type));
        out.push(',');
        out.push_str(&csv_field(&issue.message));
        out.push('\n');
    }
    out
}

/// Quote a CSV field when it needs quoting, double embedded quotes.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        let mut quoted = String::with_capacity(raw.len() + 2);
        quoted.push('"');
        for ch in raw.chars() {
            if ch == '"' {
                quoted.push('"');
            }
            quoted.push(ch);
        }
        quoted.push('"');
        quoted
    } else {
        raw.to_string()
    }
}

// =============================================================================
// RUN SUMMARY
// =============================================================================

/// Aggregate numbers for a finished run, for logs and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Persons processed.
    pub people: usize,
    /// Iterations actually executed.
    pub iterations: u32,
    /// Why the run ended.
    pub termination: TerminationReason,
    /// How many times each rule ran, by rule id.
    pub rule_runs: BTreeMap<String, u64>,
    /// Inferred events across all overlays.
    pub inferred_events: usize,
    /// Tightened date bounds across all overlays.
    pub date_bounds: usize,
    /// Issue counts by severity name.
    pub issues_by_severity: BTreeMap<String, usize>,
    /// Total issues recorded.
    pub issues_total: usize,
}

impl RunSummary {
    /// Summarize a finished run.
    #[must_use]
    pub fn from_result(result: &RunResult) -> Self {
        let mut issues_by_severity: BTreeMap<String, usize> = BTreeMap::new();
        for severity in [Severity::Info, Severity::Warning, Severity::Error] {
            issues_by_severity.insert(severity.as_str().to_string(), 0);
        }
        for issue in &result.issues {
            *issues_by_severity
                .entry(issue.severity.as_str().to_string())
                .or_insert(0) += 1;
        }

        Self {
            people: result.people.len(),
            iterations: result.iterations,
            termination: result.termination,
            rule_runs: result.rule_runs.clone(),
            inferred_events: result
                .people
                .values()
                .map(|p| p.inferred_events().len())
                .sum(),
            date_bounds: result.people.values().map(|p| p.date_bounds().len()).sum(),
            issues_by_severity,
            issues_total: result.issues.len(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
