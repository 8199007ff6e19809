//! Runtime configuration for the ticketing agent.

/// Default port the agent listens on.
pub const DEFAULT_PORT: u16 = 8003;

/// Project issues land in when the caller does not name one.
pub const DEFAULT_PROJECT: &str = "KAN";

/// Configuration for the ticketing agent.
#[derive(Debug, Clone)]
pub struct JiraConfig {
    /// Atlassian site base URL, e.g. `https://example.atlassian.net`
    pub base_url: String,
    /// Account email for basic auth
    pub email: String,
    /// API token paired with the email
    pub api_token: String,
    /// Project key used when a request does not name one
    pub default_project: String,
    /// Base URL advertised on the agent card
    pub public_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl JiraConfig {
    /// Trimmed base URL without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_strips_trailing_slash() {
        let config = JiraConfig {
            base_url: "https://example.atlassian.net/".to_string(),
            email: String::new(),
            api_token: String::new(),
            default_project: DEFAULT_PROJECT.to_string(),
            public_url: String::new(),
            timeout_secs: 30,
        };
        assert_eq!(config.api_base(), "https://example.atlassian.net");
    }
}
