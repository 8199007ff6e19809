//! Runtime configuration for the diagnostics agent.

use std::time::Duration;

/// Default port the agent listens on.
pub const DEFAULT_PORT: u16 = 8002;

/// Resource kind the solution endpoints scope to when the caller does not
/// narrow the analysis themselves. Pod analysis is by far the fastest.
pub const DEFAULT_FILTER: &str = "Pod";

/// Configuration for the diagnostics agent.
///
/// Everything the invoker and the facade need is carried here explicitly;
/// no module reads the environment behind the caller's back.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Path or name of the k8sgpt binary
    pub binary: String,
    /// Base URL advertised on the agent card
    pub public_url: String,
    /// Budget for the quick un-explained scan
    pub analyze_timeout: Duration,
    /// Budget for AI-explained analysis (synchronous and streaming)
    pub explain_timeout: Duration,
    /// Cadence of `analyzing` heartbeats on the stream
    pub progress_interval: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary: "k8sgpt".to_string(),
            public_url: format!("http://localhost:{DEFAULT_PORT}"),
            analyze_timeout: Duration::from_secs(30),
            explain_timeout: Duration::from_secs(120),
            progress_interval: Duration::from_secs(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_budgets() {
        let config = AgentConfig::default();
        assert_eq!(config.analyze_timeout, Duration::from_secs(30));
        assert_eq!(config.explain_timeout, Duration::from_secs(120));
        assert_eq!(config.progress_interval, Duration::from_secs(2));
        assert_eq!(config.binary, "k8sgpt");
    }
}
