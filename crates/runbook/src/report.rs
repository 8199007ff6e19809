//! Parsed shape of the diagnostics agent's output.
//!
//! The agent passes k8sgpt's JSON through opaquely; this module is where
//! the workflow finally interprets it. Parsing is deliberately tolerant:
//! every field is optional so a partial report still matches what it can.

use serde::Deserialize;

/// A full analysis report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisReport {
    /// Detected issues
    #[serde(default)]
    pub results: Vec<DetectedIssue>,
    /// Total problem count, when the tool reports one
    #[serde(default)]
    pub problems: Option<u64>,
}

/// One detected issue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectedIssue {
    /// Resource kind, e.g. `Pod`
    #[serde(default)]
    pub kind: String,
    /// Resource name, possibly `namespace/name`
    #[serde(default)]
    pub name: String,
    /// Failure descriptions
    #[serde(default)]
    pub error: Vec<Failure>,
    /// AI-generated remediation details, present once explanation was requested
    #[serde(default)]
    pub details: Option<String>,
}

/// One failure entry on a detected issue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Failure {
    /// Failure text
    #[serde(rename = "Text", default)]
    pub text: String,
}

impl DetectedIssue {
    /// Resource name without its namespace prefix.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// First failure text, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<&str> {
        self.error.first().map(|failure| failure.text.as_str())
    }
}

impl AnalysisReport {
    /// Parse a report from the agent's opaque result text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Find the issue whose name contains `expect_name`, case-insensitively.
#[must_use]
pub fn find_issue<'a>(report: &'a AnalysisReport, expect_name: &str) -> Option<&'a DetectedIssue> {
    let needle = expect_name.to_lowercase();
    report
        .results
        .iter()
        .find(|issue| issue.name.to_lowercase().contains(&needle))
}

/// Pull the remediation details for `issue_name` out of a solution
/// payload: the matching result's details, else the first result's, else a
/// truncated slice of the raw text when it is not a report at all.
#[must_use]
pub fn extract_details(solution_text: &str, issue_name: &str) -> String {
    match AnalysisReport::parse(solution_text) {
        Ok(report) if !report.results.is_empty() => report
            .results
            .iter()
            .find(|result| result.name.contains(issue_name))
            .or_else(|| report.results.first())
            .and_then(|result| result.details.clone())
            .unwrap_or_else(|| "No detailed solution".to_string()),
        Ok(_) => "No solution available".to_string(),
        Err(_) if solution_text.is_empty() => "No solution available".to_string(),
        Err(_) => {
            let mut raw = solution_text.to_string();
            raw.truncate(500);
            raw
        }
    }
}
