//! Invoker for the external `k8sgpt` diagnostics CLI.
//!
//! Two invocation shapes exist: a quick scan (`analyze`) that lists
//! detected issues without consulting an AI backend, and an explained
//! analysis (`explain`) that asks the backend for remediation details and
//! can run for minutes. Both apply a hard timeout and perform no retries.

use std::process::Output;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::AgentConfig;

/// Placeholder returned when a scan produced nothing usable.
pub const EMPTY_RESULTS: &str = r#"{"results":[]}"#;

/// klog warning lines (`W0312 10:04:05 ...`) and k8sgpt debug chatter that
/// the CLI interleaves with its JSON output on stdout.
static DIAGNOSTIC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(W\d{4}\s|Debug:)").unwrap());

/// Errors from a k8sgpt invocation.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The CLI did not finish within its budget
    #[error("k8sgpt timed out after {budget_secs}s")]
    Timeout {
        /// Budget that was exceeded, in seconds
        budget_secs: u64,
    },

    /// The CLI could not be spawned at all
    #[error("failed to run k8sgpt: {0}")]
    Launch(#[from] std::io::Error),

    /// The CLI exited unsuccessfully
    #[error("k8sgpt exited with {status}: {stderr}")]
    Failed {
        /// Exit status as reported by the OS
        status: std::process::ExitStatus,
        /// Trimmed stderr for context
        stderr: String,
    },

    /// The CLI exited cleanly but produced no usable output
    #[error("k8sgpt produced no output")]
    EmptyOutput,
}

/// Interface to cluster diagnostics, kept as a trait so the HTTP facade
/// and the streaming wrapper can be exercised against a stub.
#[async_trait]
pub trait ClusterAnalyzer: Send + Sync {
    /// Quick un-explained scan of the cluster.
    ///
    /// Returns the raw scan output, or [`EMPTY_RESULTS`] when the scan
    /// found nothing or its output was unusable. Only a timeout or a
    /// failure to launch the CLI is an error on this path.
    async fn analyze(&self) -> Result<String, AnalyzerError>;

    /// AI-explained analysis, optionally narrowed to one resource kind.
    ///
    /// Returns the explained output with CLI log chatter stripped. Unlike
    /// [`analyze`](Self::analyze), an unsuccessful exit or empty output is
    /// an error here: callers asked for an explanation and silently handing
    /// them a placeholder would be indistinguishable from success.
    async fn explain(&self, filter: Option<&str>) -> Result<String, AnalyzerError>;
}

/// Runs the real `k8sgpt` binary.
#[derive(Debug, Clone)]
pub struct K8sgptRunner {
    config: AgentConfig,
}

impl K8sgptRunner {
    /// Create a runner for the given configuration.
    #[must_use]
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Spawn the CLI with the given arguments and wait for it, enforcing
    /// `budget`. The child is reaped if the calling future is dropped.
    async fn run(&self, args: &[&str], budget: Duration) -> Result<Output, AnalyzerError> {
        debug!(binary = %self.config.binary, ?args, "invoking k8sgpt");

        let mut command = Command::new(&self.config.binary);
        command.args(args).kill_on_drop(true);

        match tokio::time::timeout(budget, command.output()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AnalyzerError::Timeout {
                budget_secs: budget.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl ClusterAnalyzer for K8sgptRunner {
    async fn analyze(&self) -> Result<String, AnalyzerError> {
        let output = self
            .run(&["analyze", "--output=json"], self.config.analyze_timeout)
            .await?;

        if !output.status.success() {
            warn!(status = %output.status, "k8sgpt scan failed, reporting empty result set");
            return Ok(EMPTY_RESULTS.to_string());
        }

        // Some k8sgpt builds report over stderr when stdout is empty.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let text = if stdout.trim().is_empty() {
            stderr.trim()
        } else {
            stdout.trim()
        };

        if text.is_empty() {
            Ok(EMPTY_RESULTS.to_string())
        } else {
            Ok(text.to_string())
        }
    }

    async fn explain(&self, filter: Option<&str>) -> Result<String, AnalyzerError> {
        let mut args = vec!["analyze", "--explain", "--output=json"];
        if let Some(kind) = filter {
            args.push("--filter");
            args.push(kind);
        }

        let output = self.run(&args, self.config.explain_timeout).await?;

        if !output.status.success() {
            return Err(AnalyzerError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = strip_diagnostic_lines(&String::from_utf8_lossy(&output.stdout));
        if text.is_empty() {
            return Err(AnalyzerError::EmptyOutput);
        }

        Ok(text)
    }
}

/// Drop klog warning and debug lines that k8sgpt interleaves with its JSON
/// output, returning the trimmed remainder.
#[must_use]
pub fn strip_diagnostic_lines(raw: &str) -> String {
    let kept: Vec<&str> = raw
        .lines()
        .filter(|line| !DIAGNOSTIC_LINE.is_match(line))
        .collect();
    kept.join("\n").trim().to_string()
}
