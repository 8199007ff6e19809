//! Client for the ticketing agent.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors talking to the ticketing agent.
#[derive(Debug, Error)]
pub enum TicketError {
    /// Transport-level failure
    #[error("ticket request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The agent reported a failure
    #[error("ticket agent error: {0}")]
    Remote(String),
}

/// A freshly filed ticket.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTicket {
    /// Issue key, e.g. `KAN-42`
    pub key: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Client for the ticketing agent.
#[derive(Debug, Clone)]
pub struct TicketClient {
    base_url: String,
    client: reqwest::Client,
}

impl TicketClient {
    /// Create a client for the agent at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// File a new ticket.
    pub async fn create(
        &self,
        project: Option<&str>,
        summary: &str,
        description: &str,
    ) -> Result<CreatedTicket, TicketError> {
        debug!(%summary, "filing ticket");
        let response = self
            .client
            .post(format!("{}/issues", self.base_url))
            .json(&serde_json::json!({
                "project": project,
                "summary": summary,
                "description": description,
            }))
            .send()
            .await?;
        let response = check_error(response).await?;
        Ok(response.json().await?)
    }

    /// Comment on an existing ticket.
    pub async fn comment(&self, key: &str, text: &str) -> Result<(), TicketError> {
        let response = self
            .client
            .post(format!("{}/issues/{key}/comments", self.base_url))
            .json(&serde_json::json!({ "comment": text }))
            .send()
            .await?;
        check_error(response).await?;
        Ok(())
    }

    /// Close a ticket with a resolution comment.
    pub async fn close(&self, key: &str, comment: Option<&str>) -> Result<(), TicketError> {
        let response = self
            .client
            .post(format!("{}/issues/{key}/close", self.base_url))
            .json(&serde_json::json!({ "comment": comment }))
            .send()
            .await?;
        check_error(response).await?;
        Ok(())
    }
}

/// Surface a non-success response as a remote error, preferring the
/// structured `{"error": ...}` body when present.
async fn check_error(response: reqwest::Response) -> Result<reqwest::Response, TicketError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map_or_else(|_| format!("{status}: {body}"), |envelope| envelope.error);
    Err(TicketError::Remote(message))
}
