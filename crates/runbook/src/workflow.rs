//! The manual, narrated incident workflow.
//!
//! Walks one scenario through the full pipeline: inject the fault, detect
//! it, fetch an AI remediation suggestion, file a ticket, fix, verify,
//! and close the ticket. Each step is gated on ENTER so a human can
//! follow along; `--no-pause` runs straight through.

use std::io::Write as _;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::diagnostics::DiagnosticsClient;
use crate::report::{extract_details, find_issue, DetectedIssue};
use crate::scenarios::Scenario;
use crate::shell::run_recipe;
use crate::tickets::TicketClient;

/// Knobs for a workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    /// Project key to file the ticket under; the agent's default when absent
    pub project: Option<String>,
    /// Gate each step on ENTER
    pub pause: bool,
    /// Seconds to let the fault manifest before analyzing
    pub settle_secs: u64,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            project: None,
            pause: true,
            settle_secs: 15,
        }
    }
}

fn banner(text: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", text.bold());
    println!("{}", "=".repeat(60));
}

fn step(title: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", "-".repeat(60));
}

fn pause(options: &WorkflowOptions, next: &str) {
    if !options.pause {
        return;
    }
    print!("\nPress ENTER to continue to {next}...");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}

/// Run the full pipeline for one scenario.
pub async fn run(
    scenario: &Scenario,
    diagnostics: &DiagnosticsClient,
    tickets: &TicketClient,
    options: &WorkflowOptions,
) -> Result<()> {
    banner(&format!("Testing: {}", scenario.name));

    // Step 1: inject the fault and let it manifest.
    step("[Step 1] Creating K8s Issue");
    inject(scenario).await?;

    print!("\n⏳ Waiting for issue to manifest");
    let _ = std::io::stdout().flush();
    for _ in 0..options.settle_secs {
        print!(".");
        let _ = std::io::stdout().flush();
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    println!(" Done!");

    pause(options, "analysis");

    // Step 2: detect the fault through the diagnostics agent.
    step("[Step 2] Analyzing with K8sGPT Agent");
    let report = diagnostics
        .analyze()
        .await
        .context("cluster analysis failed")?;

    let Some(issue) = find_issue(&report, scenario.expect_name) else {
        println!("{} Specific issue not found in analysis", "❌".red());
        println!("   Expected: {}", scenario.name);
        println!("   Agent found {} other issues", report.results.len());
        println!("\n💡 Possible reasons:");
        println!("   - Issue hasn't manifested yet (wait longer)");
        println!("   - The analyzer doesn't detect this issue type");
        println!("   - Resource name mismatch");
        bail!("cannot proceed without detecting the issue");
    };
    let issue = issue.clone();

    println!(
        "{} Found issue: {} {}",
        "✅".green(),
        issue.kind,
        issue.name
    );
    if let Some(error) = issue.first_error() {
        println!("   Error: {error}");
    }

    pause(options, "get solution");

    // Step 3: fetch the AI remediation suggestion, streaming progress.
    step("[Step 3] Getting Solution from K8sGPT Agent");
    let details = fetch_solution(diagnostics, scenario, &issue).await;
    println!("📥 Recommendation: {}", truncated(&details, 200));

    pause(options, "ticket creation");

    // Step 4: file the ticket.
    step("[Step 4] Creating JIRA Issue");
    let summary = format!("{} {} issue", issue.kind, issue.short_name());
    let description = ticket_description(scenario, &issue, &details, &report.problems);
    let ticket = tickets
        .create(options.project.as_deref(), &summary, &description)
        .await
        .context("ticket creation failed")?;
    println!("{} Ticket created: {}", "✅".green(), ticket.key.bold());

    pause(options, "fix");

    // Step 5: apply the fix recipe.
    step("[Step 5] Applying Fix");
    println!("📤 Command: {}", scenario.fix);
    println!("   Method: {}", scenario.fix_description);
    let fix_outcome = apply_fix(scenario).await?;

    pause(options, "verification");

    // Step 6: verify.
    step("[Step 6] Verifying Fix");
    println!("📤 Check: {}", scenario.verify);
    let verification = verify(scenario, &issue).await?;

    pause(options, "ticket update");

    // Step 7: record the outcome on the ticket.
    step("[Step 7] Updating JIRA");
    tickets
        .comment(
            &ticket.key,
            &fix_comment(scenario, &details, &fix_outcome, &verification),
        )
        .await
        .context("ticket update failed")?;
    println!("{} Ticket updated", "✅".green());

    pause(options, "ticket close");

    // Step 8: close the ticket.
    step("[Step 8] Closing JIRA");
    let resolution = resolution_comment(scenario, &issue, &details, &ticket.key, &verification);
    tickets
        .close(&ticket.key, Some(resolution.as_str()))
        .await
        .context("ticket close failed")?;
    println!("{} Ticket closed: {}", "✅".green(), ticket.key.bold());

    banner("✅ Workflow Complete!");
    Ok(())
}

/// Inject the scenario's fault.
pub async fn inject(scenario: &Scenario) -> Result<()> {
    println!("🔧 Creating: {}", scenario.name);
    let output = run_recipe(scenario.inject)
        .await
        .context("inject recipe failed to run")?;
    if output.success || output.stdout_mentions("created") {
        println!("   {} Created", "✅".green());
        Ok(())
    } else {
        println!("   {} Failed: {}", "❌".red(), output.stderr.trim());
        bail!("could not inject {}", scenario.key);
    }
}

/// Fetch the remediation suggestion, preferring the streaming endpoint
/// and falling back to the synchronous one. A total failure degrades to a
/// placeholder so the workflow can still file and close the ticket.
async fn fetch_solution(
    diagnostics: &DiagnosticsClient,
    scenario: &Scenario,
    issue: &DetectedIssue,
) -> String {
    let kind = if issue.kind.is_empty() {
        scenario.kind
    } else {
        issue.kind.as_str()
    };
    println!("📤 Requesting solution for {kind} (streaming progress)");

    let streamed = diagnostics
        .stream_solution(kind, |elapsed| {
            print!("\r   ⏱️  Elapsed: {elapsed}s - AI model processing...");
            let _ = std::io::stdout().flush();
        })
        .await;

    let solution = match streamed {
        Ok(solution) => {
            println!("\r   {} Analysis complete!{}", "✅".green(), " ".repeat(30));
            Some(solution)
        }
        Err(err) => {
            println!("\r   Streaming failed ({err}), using standard endpoint...");
            match diagnostics.solution(kind).await {
                Ok(solution) => Some(solution),
                Err(err) => {
                    println!("   {} Solution retrieval failed: {err}", "⚠️".yellow());
                    None
                }
            }
        }
    };

    solution.map_or_else(
        || "Manual investigation required".to_string(),
        |text| extract_details(&text, &issue.name),
    )
}

/// Apply the fix recipe, tolerating recipes that report success on
/// stdout while exiting non-zero.
async fn apply_fix(scenario: &Scenario) -> Result<String> {
    let output = run_recipe(scenario.fix)
        .await
        .context("fix recipe failed to run")?;
    if output.success || output.stdout_mentions("deleted") {
        println!("   {} Fixed", "✅".green());
        Ok(format!("Fix applied: {}", scenario.fix))
    } else {
        println!("   {} Fix attempted: {}", "⚠️".yellow(), output.stderr.trim());
        Ok(format!("Fix attempted: {}", scenario.fix))
    }
}

/// Run the verify recipe and narrate the outcome.
async fn verify(scenario: &Scenario, issue: &DetectedIssue) -> Result<String> {
    let output = run_recipe(scenario.verify)
        .await
        .context("verify recipe failed to run")?;
    if output.success {
        if scenario.verifies_removal() {
            println!(
                "   Result: {} '{}' removed from cluster",
                issue.kind,
                issue.short_name()
            );
        } else {
            println!(
                "   Result: {} '{}' is now healthy",
                issue.kind,
                issue.short_name()
            );
        }
        println!("   {} Verified - issue resolved", "✅".green());
        Ok("Verified - issue resolved".to_string())
    } else {
        println!("   {} Still present or verification failed", "⚠️".yellow());
        Ok("Verification incomplete".to_string())
    }
}

fn truncated(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn ticket_description(
    scenario: &Scenario,
    issue: &DetectedIssue,
    details: &str,
    problems: &Option<u64>,
) -> String {
    let total = problems.map_or_else(|| "unknown".to_string(), |count| count.to_string());
    format!(
        "Issue Type: {name}\n\
         Detected by: K8sGPT Agent\n\n\
         Resource Details:\n\
         - Kind: {kind}\n\
         - Name: {resource}\n\
         - Error: {error}\n\n\
         K8sGPT Recommended Solution:\n{solution}\n\n\
         Note: This issue is specific to {name}. Total cluster issues detected: {total}",
        name = scenario.name,
        kind = issue.kind,
        resource = issue.name,
        error = issue.first_error().unwrap_or("No error details"),
        solution = truncated(details, 800),
    )
}

fn fix_comment(
    scenario: &Scenario,
    details: &str,
    fix_outcome: &str,
    verification: &str,
) -> String {
    format!(
        "Fix Applied by Runbook\n\n\
         📋 Issue: {name}\n\
         💡 K8sGPT Recommendation: {solution}\n\
         🔧 Action Taken: {fix}\n\
         📊 Result: {fix_outcome}\n\
         ✓ Verification: {verification}\n\n\
         🤖 Workflow:\n\
         - Detected by: K8sGPT Agent\n\
         - Solution by: K8sGPT Agent (AI-powered)\n\
         - Fixed by: Runbook (kubectl command)\n\
         - Verified by: Runbook",
        name = scenario.name,
        solution = truncated(details, 300),
        fix = scenario.fix,
    )
}

fn resolution_comment(
    scenario: &Scenario,
    issue: &DetectedIssue,
    details: &str,
    ticket_key: &str,
    verification: &str,
) -> String {
    format!(
        "✅ Issue Resolved\n\n\
         📝 Summary:\n\
         - Issue Type: {name}\n\
         - Resource: {kind} {resource}\n\
         - Root Cause: {cause}\n\n\
         💡 K8sGPT Solution:\n{solution}\n\n\
         🔄 Resolution Workflow:\n\
         1. K8sGPT Agent detected the issue\n\
         2. K8sGPT Agent provided AI-powered solution\n\
         3. JIRA Agent created ticket {ticket_key}\n\
         4. Runbook applied fix: {fix}\n\
         5. Runbook verified resolution\n\
         6. JIRA Agent closed ticket\n\n\
         ✓ Final Status: {verification}",
        name = scenario.name,
        kind = issue.kind,
        resource = issue.short_name(),
        cause = truncated(issue.first_error().unwrap_or("N/A"), 100),
        solution = truncated(details, 400),
        fix = scenario.fix,
    )
}
