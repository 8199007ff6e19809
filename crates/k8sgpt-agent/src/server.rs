//! HTTP facade for the diagnostics agent.
//!
//! Exposes the agent card plus three operations: a quick scan, a
//! synchronous explained solution, and the streaming variant. Every
//! failure is converted into a structured JSON error body at this
//! boundary; nothing is allowed to take the process down.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::sse::{Event, Sse},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use protocol::{AgentCard, AgentSkill, AGENT_CARD_PATH};

use crate::analyzer::{AnalyzerError, ClusterAnalyzer};
use crate::config::{AgentConfig, DEFAULT_FILTER};
use crate::stream::solution_stream;

/// Shared state for the diagnostics facade.
pub struct AppState {
    /// Invoker for the diagnostics CLI
    pub analyzer: Arc<dyn ClusterAnalyzer>,
    /// Agent configuration
    pub config: AgentConfig,
}

/// Build the agent's router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(AGENT_CARD_PATH, get(agent_card_handler))
        .route("/analysis", post(analysis_handler))
        .route("/solution", post(solution_handler))
        .route("/solution/stream", post(solution_stream_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request body for the solution endpoints. The body is optional; an
/// absent or unparseable body means the default filter.
#[derive(Debug, Default, Deserialize)]
pub struct SolutionRequest {
    /// Resource kind to narrow the analysis to
    pub filter: Option<String>,
}

impl SolutionRequest {
    /// Lenient parse of a request body: missing or malformed bodies fall
    /// back to the defaults rather than rejecting the request.
    fn from_body(body: &Bytes) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The requested filter, or the default kind.
    fn filter_or_default(self) -> String {
        self.filter
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }
}

/// Successful quick-scan response.
#[derive(Debug, Serialize)]
struct AnalysisResponse {
    result: String,
}

/// Successful solution response.
#[derive(Debug, Serialize)]
struct SolutionResponse {
    solution: String,
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

impl From<AnalyzerError> for ApiError {
    fn from(err: AnalyzerError) -> Self {
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
        name: "k8sgpt_agent".to_string(),
        description: "K8sGPT agent for cluster analysis".to_string(),
        url: state.config.public_url.clone(),
        skills: vec![
            AgentSkill::new("analyze_cluster", "Analyze K8s cluster for issues"),
            AgentSkill::new("get_solution", "Get solution for K8s issue"),
            AgentSkill::new("stream_solution", "Get solution with streamed progress"),
        ],
    })
}

/// Quick un-explained cluster scan.
async fn analysis_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let result = state.analyzer.analyze().await?;
    info!(bytes = result.len(), "cluster scan finished");
    Ok(Json(AnalysisResponse { result }))
}

/// Synchronous explained solution: the invocation runs on a background
/// task and the handler joins it within the explain budget.
async fn solution_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SolutionResponse>, ApiError> {
    let filter = SolutionRequest::from_body(&body).filter_or_default();
    info!(%filter, "explained analysis requested");

    let analyzer = state.analyzer.clone();
    let task =
        tokio::spawn(async move { analyzer.explain(Some(filter.as_str())).await });

    let budget = state.config.explain_timeout;
    match tokio::time::timeout(budget, task).await {
        Ok(Ok(Ok(solution))) => Ok(Json(SolutionResponse { solution })),
        Ok(Ok(Err(err))) => Err(err.into()),
        Ok(Err(join_err)) => Err(ApiError(format!("analysis task failed: {join_err}"))),
        Err(_) => Err(ApiError(format!(
            "solution timed out after {}s",
            budget.as_secs()
        ))),
    }
}

/// Streaming explained solution: progress heartbeats as SSE frames, then
/// one terminal frame (or none if the budget runs out).
async fn solution_stream_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let filter = SolutionRequest::from_body(&body).filter_or_default();
    info!(%filter, "streaming analysis requested");

    let events = solution_stream(
        state.analyzer.clone(),
        Some(filter),
        state.config.explain_timeout,
        state.config.progress_interval,
    );

    Sse::new(events.map(|event| Event::default().json_data(&event)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Stub analyzer with canned outcomes.
    struct StubAnalyzer {
        analyze: Result<String, String>,
        explain: Result<String, String>,
    }

    #[async_trait]
    impl ClusterAnalyzer for StubAnalyzer {
        async fn analyze(&self) -> Result<String, AnalyzerError> {
            self.analyze.clone().map_err(|_| AnalyzerError::EmptyOutput)
        }

        async fn explain(&self, _filter: Option<&str>) -> Result<String, AnalyzerError> {
            self.explain.clone().map_err(|_| AnalyzerError::EmptyOutput)
        }
    }

    fn state_with(stub: StubAnalyzer) -> Arc<AppState> {
        Arc::new(AppState {
            analyzer: Arc::new(stub),
            config: AgentConfig::default(),
        })
    }

    #[tokio::test]
    async fn analysis_returns_scan_output() {
        let state = state_with(StubAnalyzer {
            analyze: Ok(r#"{"results":[]}"#.to_string()),
            explain: Err("unused".to_string()),
        });
        let Json(response) = analysis_handler(State(state)).await.unwrap();
        assert_eq!(response.result, r#"{"results":[]}"#);
    }

    #[tokio::test]
    async fn analysis_failure_becomes_api_error() {
        let state = state_with(StubAnalyzer {
            analyze: Err("boom".to_string()),
            explain: Err("unused".to_string()),
        });
        let err = analysis_handler(State(state)).await.unwrap_err();
        assert_eq!(err.to_string(), "k8sgpt produced no output");
    }

    #[test]
    fn empty_and_malformed_bodies_fall_back_to_default_filter() {
        assert_eq!(
            SolutionRequest::from_body(&Bytes::new()).filter_or_default(),
            DEFAULT_FILTER
        );
        assert_eq!(
            SolutionRequest::from_body(&Bytes::from_static(b"not json")).filter_or_default(),
            DEFAULT_FILTER
        );
        assert_eq!(
            SolutionRequest::from_body(&Bytes::from_static(br#"{"filter":"Service"}"#))
                .filter_or_default(),
            "Service"
        );
    }

    #[tokio::test]
    async fn solution_defaults_filter_when_body_absent() {
        let state = state_with(StubAnalyzer {
            analyze: Err("unused".to_string()),
            explain: Ok("explained".to_string()),
        });
        let Json(response) = solution_handler(State(state), Bytes::new()).await.unwrap();
        assert_eq!(response.solution, "explained");
    }

    #[tokio::test]
    async fn solution_failure_becomes_api_error() {
        let state = state_with(StubAnalyzer {
            analyze: Err("unused".to_string()),
            explain: Err("boom".to_string()),
        });
        let err = solution_handler(
            State(state),
            Bytes::from_static(br#"{"filter":"Service"}"#),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "k8sgpt produced no output");
    }

    #[tokio::test]
    async fn agent_card_lists_all_skills() {
        let state = state_with(StubAnalyzer {
            analyze: Err("unused".to_string()),
            explain: Err("unused".to_string()),
        });
        let Json(card) = agent_card_handler(State(state)).await;
        assert_eq!(card.name, "k8sgpt_agent");
        let names: Vec<_> = card.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["analyze_cluster", "get_solution", "stream_solution"]
        );
    }
}
