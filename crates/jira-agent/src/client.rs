//! Atlassian REST API v3 client.
//!
//! Covers exactly what the harness needs: issue creation, comments, and
//! the transition dance required to close an issue (list the available
//! workflow transitions, pick the one leading to Done, apply it).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::JiraConfig;

/// Errors from the Atlassian API.
#[derive(Debug, Error)]
pub enum JiraError {
    /// Transport-level failure
    #[error("JIRA request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("JIRA API error ({status}): {body}")]
    Api {
        /// HTTP status returned
        status: reqwest::StatusCode,
        /// Response body for context
        body: String,
    },

    /// The issue's workflow has no transition to Done
    #[error("no Done transition available for {issue}")]
    NoDoneTransition {
        /// Issue that could not be closed
        issue: String,
    },
}

/// A freshly created issue, echoed back to facade callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedIssue {
    /// Issue key, e.g. `KAN-42`
    pub key: String,
    /// Numeric issue id
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct TransitionsResponse {
    transitions: Vec<Transition>,
}

#[derive(Debug, Deserialize)]
struct Transition {
    id: String,
    name: String,
    to: TransitionTarget,
}

#[derive(Debug, Deserialize)]
struct TransitionTarget {
    name: String,
}

/// Client for the Atlassian REST API v3.
#[derive(Debug, Clone)]
pub struct JiraClient {
    config: JiraConfig,
    client: reqwest::Client,
}

impl JiraClient {
    /// Create a new client for the given configuration.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be created.
    #[must_use]
    pub fn new(config: JiraConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create a Bug issue in the given project.
    pub async fn create_issue(
        &self,
        project: &str,
        summary: &str,
        description: &str,
    ) -> Result<CreatedIssue, JiraError> {
        let url = format!("{}/rest/api/3/issue", self.config.api_base());
        let payload = json!({
            "fields": {
                "project": { "key": project },
                "summary": summary,
                "description": adf_document(description),
                "issuetype": { "name": "Bug" }
            }
        });

        debug!(%project, %summary, "creating issue");
        let response = self.post_json(&url, &payload).await?;
        let created: CreatedIssue = response.json().await?;
        info!(key = %created.key, "issue created");
        Ok(created)
    }

    /// Add a comment to an issue.
    pub async fn add_comment(&self, issue_key: &str, text: &str) -> Result<(), JiraError> {
        let url = format!(
            "{}/rest/api/3/issue/{issue_key}/comment",
            self.config.api_base()
        );
        let payload = json!({ "body": adf_document(text) });

        debug!(%issue_key, "adding comment");
        self.post_json(&url, &payload).await?;
        Ok(())
    }

    /// Close an issue: optionally leave a final comment, then apply the
    /// workflow transition leading to Done.
    pub async fn close_issue(
        &self,
        issue_key: &str,
        comment: Option<&str>,
    ) -> Result<(), JiraError> {
        if let Some(text) = comment.filter(|text| !text.is_empty()) {
            self.add_comment(issue_key, text).await?;
        }

        let url = format!(
            "{}/rest/api/3/issue/{issue_key}/transitions",
            self.config.api_base()
        );

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .send()
            .await?;
        let response = check_status(response).await?;
        let listing: TransitionsResponse = response.json().await?;

        let done = listing
            .transitions
            .iter()
            .find(|t| {
                t.name.eq_ignore_ascii_case("done") || t.to.name.eq_ignore_ascii_case("done")
            })
            .ok_or_else(|| JiraError::NoDoneTransition {
                issue: issue_key.to_string(),
            })?;

        debug!(%issue_key, transition = %done.id, "applying Done transition");
        self.post_json(&url, &json!({ "transition": { "id": done.id } }))
            .await?;
        info!(%issue_key, "issue closed");
        Ok(())
    }

    /// POST a JSON payload with basic auth, surfacing non-success bodies.
    async fn post_json(&self, url: &str, payload: &Value) -> Result<reqwest::Response, JiraError> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .json(payload)
            .send()
            .await?;
        check_status(response).await
    }
}

/// Surface a non-success response as an API error carrying the body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, JiraError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(JiraError::Api { status, body })
}

/// Minimal Atlassian Document Format body: one paragraph of plain text.
fn adf_document(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }]
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> JiraClient {
        JiraClient::new(JiraConfig {
            base_url: server.uri(),
            email: "dev@example.com".to_string(),
            api_token: "token".to_string(),
            default_project: "KAN".to_string(),
            public_url: String::new(),
            timeout_secs: 5,
        })
    }

    #[test]
    fn adf_document_wraps_text_in_paragraph() {
        let doc = adf_document("hello");
        assert_eq!(doc["type"], "doc");
        assert_eq!(doc["content"][0]["content"][0]["text"], "hello");
    }

    #[tokio::test]
    async fn create_issue_posts_adf_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue"))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({
                "fields": {
                    "project": { "key": "KAN" },
                    "summary": "Pod broken-image-pod issue",
                    "issuetype": { "name": "Bug" }
                }
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "key": "KAN-7", "id": "10007" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let created = client_for(&server)
            .create_issue("KAN", "Pod broken-image-pod issue", "details")
            .await
            .unwrap();
        assert_eq!(created.key, "KAN-7");
        assert_eq!(created.id, "10007");
    }

    #[tokio::test]
    async fn create_issue_surfaces_api_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"errors":{"project":"invalid"}}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_issue("NOPE", "s", "d")
            .await
            .unwrap_err();
        match err {
            JiraError::Api { status, body } => {
                assert_eq!(status.as_u16(), 400);
                assert!(body.contains("invalid"));
            }
            other => panic!("expected Api error, got {other}"),
        }
    }

    #[tokio::test]
    async fn close_issue_applies_done_transition() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/KAN-7/transitions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transitions": [
                    { "id": "11", "name": "In Progress", "to": { "name": "In Progress" } },
                    { "id": "31", "name": "Finish", "to": { "name": "Done" } }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue/KAN-7/transitions"))
            .and(body_partial_json(json!({ "transition": { "id": "31" } })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).close_issue("KAN-7", None).await.unwrap();
    }

    #[tokio::test]
    async fn close_issue_comments_first_when_given_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue/KAN-7/comment"))
            .and(body_partial_json(json!({
                "body": { "type": "doc", "version": 1 }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/KAN-7/transitions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transitions": [{ "id": "31", "name": "Done", "to": { "name": "Done" } }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue/KAN-7/transitions"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server)
            .close_issue("KAN-7", Some("resolved"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn close_issue_without_done_transition_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/KAN-9/transitions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transitions": [{ "id": "11", "name": "Start", "to": { "name": "In Progress" } }]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .close_issue("KAN-9", None)
            .await
            .unwrap_err();
        assert!(matches!(err, JiraError::NoDoneTransition { .. }));
    }
}
