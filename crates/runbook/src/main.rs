//! Scenario-driven incident workflow CLI.
//!
//! Drives the demonstration pipeline against the two agents: inject a
//! known cluster fault, detect it via the diagnostics agent, fetch an
//! AI remediation suggestion, file a ticket via the ticketing agent,
//! fix, verify, and close the ticket.

mod diagnostics;
mod report;
mod scenarios;
mod shell;
mod tickets;
mod workflow;

use std::io::Write as _;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use diagnostics::DiagnosticsClient;
use report::AnalysisReport;
use scenarios::{Scenario, SCENARIOS};
use tickets::TicketClient;
use workflow::WorkflowOptions;

/// Scenario-driven incident workflow for the agent harness
#[derive(Parser)]
#[command(name = "runbook")]
#[command(about = "Scenario-driven incident workflow for the agent harness")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the diagnostics agent
    #[arg(long, default_value = "http://localhost:8002", global = true)]
    agent_url: String,

    /// Base URL of the ticketing agent
    #[arg(long, default_value = "http://localhost:8003", global = true)]
    jira_url: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available fault scenarios
    List,
    /// Run the full workflow for one scenario
    Run {
        /// Scenario key (see `list`)
        scenario: String,

        /// Project key to file the ticket under
        #[arg(long)]
        project: Option<String>,

        /// Run straight through without ENTER gates
        #[arg(long)]
        no_pause: bool,

        /// Seconds to let the fault manifest before analyzing
        #[arg(long, default_value = "15")]
        settle: u64,
    },
    /// Inject a scenario's fault and stop
    Inject {
        /// Scenario key
        scenario: String,
    },
    /// Apply a scenario's fix recipe
    Fix {
        /// Scenario key
        scenario: String,
    },
    /// Run a scenario's verify recipe
    Verify {
        /// Scenario key
        scenario: String,
    },
    /// Smoke-check the streaming solution endpoint
    Stream {
        /// Resource kind to narrow the analysis to
        #[arg(long, default_value = "Pod")]
        filter: String,
    },
}

fn lookup(key: &str) -> Result<&'static Scenario> {
    scenarios::find(key).with_context(|| {
        let known: Vec<&str> = SCENARIOS.iter().map(|s| s.key).collect();
        format!("unknown scenario '{key}'; available: {}", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "runbook=debug"
    } else {
        "runbook=warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::List => {
            println!("\n📋 Available Test Scenarios:");
            println!("{}", "=".repeat(60));
            for scenario in SCENARIOS {
                println!("  {} - {}", format!("{:22}", scenario.key).bold(), scenario.name);
            }
            println!("{}", "=".repeat(60));
        }
        Commands::Run {
            scenario,
            project,
            no_pause,
            settle,
        } => {
            let scenario = lookup(&scenario)?;
            let options = WorkflowOptions {
                project,
                pause: !no_pause,
                settle_secs: settle,
            };
            workflow::run(
                scenario,
                &DiagnosticsClient::new(&cli.agent_url),
                &TicketClient::new(&cli.jira_url),
                &options,
            )
            .await?;
        }
        Commands::Inject { scenario } => {
            workflow::inject(lookup(&scenario)?).await?;
        }
        Commands::Fix { scenario } => {
            let scenario = lookup(&scenario)?;
            println!("🔨 Fixing: {}", scenario.name);
            println!("   Command: {}", scenario.fix);
            let output = shell::run_recipe(scenario.fix).await?;
            if output.success || output.stdout_mentions("deleted") {
                println!("   Output: {}", output.stdout.trim());
                println!("   {} Fixed", "✅".green());
            } else {
                println!("   {} Fix attempted: {}", "⚠️".yellow(), output.stderr.trim());
            }
        }
        Commands::Verify { scenario } => {
            let scenario = lookup(&scenario)?;
            println!("✓ Verifying: {}", scenario.name);
            println!("   Check: {}", scenario.verify);
            let output = shell::run_recipe(scenario.verify).await?;
            if output.success {
                if scenario.verifies_removal() {
                    println!("   Confirmation: Resource removed (as expected)");
                } else {
                    println!("   Confirmation: Resource is healthy");
                }
                println!("   {} Verified - issue resolved", "✅".green());
            } else {
                println!("   {} Still present or verification failed", "⚠️".yellow());
                bail!("verification failed for {}", scenario.key);
            }
        }
        Commands::Stream { filter } => {
            stream_smoke_check(&cli.agent_url, &filter).await?;
        }
    }

    Ok(())
}

/// Standalone check of the streaming endpoint: narrate progress, then
/// summarize the first results of the solution payload.
async fn stream_smoke_check(agent_url: &str, filter: &str) -> Result<()> {
    println!("Testing streaming solution endpoint...");
    println!("{}", "=".repeat(60));

    let client = DiagnosticsClient::new(agent_url);
    let solution = client
        .stream_solution(filter, |elapsed| {
            print!("\r⏱️  Analyzing: {elapsed}s elapsed...");
            let _ = std::io::stdout().flush();
        })
        .await
        .context("streaming solution failed")?;
    println!("\r{} Complete!{}", "✅".green(), " ".repeat(40));

    let report = AnalysisReport::parse(&solution).unwrap_or_default();
    println!("\nResults found: {}", report.results.len());
    for result in report.results.iter().take(2) {
        println!("\n📋 {} {}", result.kind, result.name);
        if let Some(details) = &result.details {
            let preview: String = details.chars().take(200).collect();
            println!("   Solution: {preview}...");
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("{} Streaming test successful!", "✅".green());
    Ok(())
}
