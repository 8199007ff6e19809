//! JIRA ticketing agent binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use jira_agent::config::DEFAULT_PROJECT;
use jira_agent::server::AppState;
use jira_agent::{build_router, JiraClient, JiraConfig};

/// HTTP agent proxying issue management to the Atlassian REST API
#[derive(Parser)]
#[command(name = "jira-agent")]
#[command(about = "HTTP agent proxying issue management to the Atlassian REST API")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8003")]
    bind: SocketAddr,

    /// Base URL advertised on the agent card (defaults to http://<bind>)
    #[arg(long)]
    public_url: Option<String>,

    /// Atlassian site URL
    #[arg(long, env = "JIRA_URL")]
    jira_url: String,

    /// Account email for basic auth
    #[arg(long, env = "JIRA_EMAIL")]
    jira_email: String,

    /// API token paired with the email
    #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
    jira_api_token: String,

    /// Project key used when a request does not name one
    #[arg(long, default_value = DEFAULT_PROJECT)]
    project: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "jira_agent=debug,tower_http=debug"
    } else {
        "jira_agent=info"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = JiraConfig {
        base_url: cli.jira_url,
        email: cli.jira_email,
        api_token: cli.jira_api_token,
        default_project: cli.project,
        public_url: cli
            .public_url
            .unwrap_or_else(|| format!("http://{}", cli.bind)),
        timeout_secs: 30,
    };

    let state = Arc::new(AppState {
        jira: JiraClient::new(config.clone()),
        config,
    });
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    info!(addr = %cli.bind, "ticketing agent listening");

    axum::serve(listener, router)
        .await
        .context("server terminated")?;

    Ok(())
}
