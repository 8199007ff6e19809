//! HTTP facade for the ticketing agent.
//!
//! Thin JSON endpoints over [`JiraClient`]. Failures from the Atlassian
//! API are converted into structured error bodies at this boundary.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use protocol::{AgentCard, AgentSkill, AGENT_CARD_PATH};

use crate::client::{CreatedIssue, JiraClient, JiraError};
use crate::config::JiraConfig;

/// Shared state for the ticketing facade.
pub struct AppState {
    /// Atlassian API client
    pub jira: JiraClient,
    /// Agent configuration
    pub config: JiraConfig,
}

/// Build the agent's router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(AGENT_CARD_PATH, get(agent_card_handler))
        .route("/issues", post(create_issue_handler))
        .route("/issues/{key}/comments", post(comment_handler))
        .route("/issues/{key}/close", post(close_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request body for issue creation.
#[derive(Debug, Deserialize)]
pub struct CreateIssueRequest {
    /// Project key; the configured default when absent
    pub project: Option<String>,
    /// One-line summary
    pub summary: String,
    /// Plain-text description
    pub description: String,
}

/// Request body for commenting.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    /// Comment text
    pub comment: String,
}

/// Request body for closing; the comment is optional.
#[derive(Debug, Default, Deserialize)]
pub struct CloseRequest {
    /// Final comment to leave before closing
    pub comment: Option<String>,
}

impl CloseRequest {
    /// Lenient parse: a missing or malformed body closes without a
    /// comment rather than rejecting the request.
    fn from_body(body: &Bytes) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

/// Status acknowledgement body.
#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

/// JSON error body returned for any facade-level failure.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Facade-level error: always a 500 with a structured body.
#[derive(Debug)]
pub struct ApiError(String);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<JiraError> for ApiError {
    fn from(err: JiraError) -> Self {
        Self(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: self.0 }),
        )
            .into_response()
    }
}

/// Serve the static capability descriptor.
async fn agent_card_handler(State(state): State<Arc<AppState>>) -> Json<AgentCard> {
    Json(AgentCard {
        name: "jira_agent".to_string(),
        description: "JIRA agent for issue management via Atlassian REST API".to_string(),
        url: state.config.public_url.clone(),
        skills: vec![
            AgentSkill::new("create_issue", "Create JIRA issue"),
            AgentSkill::new("update_issue", "Update JIRA issue with comment"),
            AgentSkill::new("close_issue", "Close JIRA issue"),
        ],
    })
}

/// Create a new issue.
async fn create_issue_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateIssueRequest>,
) -> Result<Json<CreatedIssue>, ApiError> {
    let project = request
        .project
        .unwrap_or_else(|| state.config.default_project.clone());
    info!(%project, summary = %request.summary, "issue creation requested");

    let created = state
        .jira
        .create_issue(&project, &request.summary, &request.description)
        .await?;
    Ok(Json(created))
}

/// Comment on an existing issue.
async fn comment_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.jira.add_comment(&key, &request.comment).await?;
    Ok(Json(StatusResponse {
        status: "comment_added",
    }))
}

/// Close an issue, optionally leaving a final comment.
async fn close_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    body: Bytes,
) -> Result<Json<StatusResponse>, ApiError> {
    let request = CloseRequest::from_body(&body);
    state
        .jira
        .close_issue(&key, request.comment.as_deref())
        .await?;
    Ok(Json(StatusResponse { status: "closed" }))
}
