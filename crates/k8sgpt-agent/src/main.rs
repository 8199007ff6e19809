//! K8sGPT diagnostics agent binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use k8sgpt_agent::server::AppState;
use k8sgpt_agent::{build_router, AgentConfig, K8sgptRunner};

/// HTTP agent exposing k8sgpt cluster diagnostics
#[derive(Parser)]
#[command(name = "k8sgpt-agent")]
#[command(about = "HTTP agent exposing k8sgpt cluster diagnostics")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8002")]
    bind: SocketAddr,

    /// Base URL advertised on the agent card (defaults to http://<bind>)
    #[arg(long)]
    public_url: Option<String>,

    /// k8sgpt binary to invoke
    #[arg(long, default_value = "k8sgpt", env = "K8SGPT_BIN")]
    k8sgpt: String,

    /// Budget for the quick scan, in seconds
    #[arg(long, default_value = "30")]
    analyze_timeout: u64,

    /// Budget for explained analysis, in seconds
    #[arg(long, default_value = "120")]
    explain_timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "k8sgpt_agent=debug,tower_http=debug"
    } else {
        "k8sgpt_agent=info"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AgentConfig {
        binary: cli.k8sgpt,
        public_url: cli
            .public_url
            .unwrap_or_else(|| format!("http://{}", cli.bind)),
        analyze_timeout: Duration::from_secs(cli.analyze_timeout),
        explain_timeout: Duration::from_secs(cli.explain_timeout),
        ..AgentConfig::default()
    };

    let state = Arc::new(AppState {
        analyzer: Arc::new(K8sgptRunner::new(config.clone())),
        config,
    });
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    info!(addr = %cli.bind, "diagnostics agent listening");

    axum::serve(listener, router)
        .await
        .context("server terminated")?;

    Ok(())
}
