//! Client for the diagnostics agent.
//!
//! Wraps the agent's three operations; the streaming variant consumes the
//! SSE response frame by frame and reports progress through a callback so
//! the workflow can narrate liveness.

use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use protocol::SolutionEvent;

use crate::report::AnalysisReport;

/// Budget for the quick scan request.
const ANALYZE_TIMEOUT: Duration = Duration::from_secs(60);

/// Budget for solution requests; generous enough to outlast the agent's
/// own 120s analysis budget.
const SOLUTION_TIMEOUT: Duration = Duration::from_secs(150);

/// Errors talking to the diagnostics agent.
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    /// Transport-level failure
    #[error("diagnostics request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The agent reported a failure
    #[error("diagnostics agent error: {0}")]
    Remote(String),

    /// The agent's result text was not a parseable report
    #[error("unparseable analysis report: {0}")]
    Parse(#[from] serde_json::Error),

    /// The solution stream ended without a terminal frame
    #[error("solution stream ended without a result (analysis timed out)")]
    StreamTimedOut,
}

#[derive(Debug, Deserialize)]
struct AnalysisEnvelope {
    result: String,
}

#[derive(Debug, Deserialize)]
struct SolutionEnvelope {
    solution: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Client for the diagnostics agent.
#[derive(Debug, Clone)]
pub struct DiagnosticsClient {
    base_url: String,
    client: reqwest::Client,
}

impl DiagnosticsClient {
    /// Create a client for the agent at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Quick un-explained cluster scan, parsed into a report.
    pub async fn analyze(&self) -> Result<AnalysisReport, DiagnosticsError> {
        let response = self
            .client
            .post(format!("{}/analysis", self.base_url))
            .timeout(ANALYZE_TIMEOUT)
            .send()
            .await?;
        let response = check_error(response).await?;

        let envelope: AnalysisEnvelope = response.json().await?;
        debug!(bytes = envelope.result.len(), "scan result received");
        Ok(AnalysisReport::parse(&envelope.result)?)
    }

    /// Synchronous explained solution for the given resource kind.
    pub async fn solution(&self, filter: &str) -> Result<String, DiagnosticsError> {
        let response = self
            .client
            .post(format!("{}/solution", self.base_url))
            .timeout(SOLUTION_TIMEOUT)
            .json(&serde_json::json!({ "filter": filter }))
            .send()
            .await?;
        let response = check_error(response).await?;

        let envelope: SolutionEnvelope = response.json().await?;
        Ok(envelope.solution)
    }

    /// Streamed explained solution. `on_progress` is called with the
    /// elapsed-seconds counter for every heartbeat; the call resolves when
    /// a terminal frame arrives. A stream that ends without one is a
    /// timeout.
    pub async fn stream_solution<F>(
        &self,
        filter: &str,
        mut on_progress: F,
    ) -> Result<String, DiagnosticsError>
    where
        F: FnMut(u64),
    {
        let response = self
            .client
            .post(format!("{}/solution/stream", self.base_url))
            .timeout(SOLUTION_TIMEOUT)
            .json(&serde_json::json!({ "filter": filter }))
            .send()
            .await?;
        let response = check_error(response).await?;

        let mut frames = EventFrameParser::default();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for event in frames.push(&String::from_utf8_lossy(&chunk)) {
                match event {
                    SolutionEvent::Analyzing { elapsed } => on_progress(elapsed),
                    SolutionEvent::Complete { solution } => return Ok(solution),
                    SolutionEvent::Error { error } => return Err(DiagnosticsError::Remote(error)),
                }
            }
        }

        Err(DiagnosticsError::StreamTimedOut)
    }
}

/// Surface a non-success response as a remote error, preferring the
/// structured `{"error": ...}` body when present.
async fn check_error(response: reqwest::Response) -> Result<reqwest::Response, DiagnosticsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map_or_else(|_| format!("{status}: {body}"), |envelope| envelope.error);
    Err(DiagnosticsError::Remote(message))
}

/// Incremental parser for `data: <json>\n\n` event frames.
///
/// Chunk boundaries are arbitrary, so bytes are buffered until a blank
/// line completes a frame. Unparseable frames are skipped with a warning
/// rather than killing the stream.
#[derive(Debug, Default)]
struct EventFrameParser {
    buffer: String,
}

impl EventFrameParser {
    /// Feed a chunk, returning every event completed by it.
    fn push(&mut self, chunk: &str) -> Vec<SolutionEvent> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..end + 2).collect();
            for line in frame.lines() {
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                match serde_json::from_str::<SolutionEvent>(data.trim_start()) {
                    Ok(event) => events.push(event),
                    Err(err) => warn!(%err, frame = %line, "skipping unparseable event frame"),
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parser_handles_frames_split_across_chunks() {
        let mut parser = EventFrameParser::default();
        assert!(parser
            .push("data: {\"status\":\"analyzing\",")
            .is_empty());
        let events = parser.push("\"elapsed\":2}\n\n");
        assert_eq!(events, [SolutionEvent::Analyzing { elapsed: 2 }]);
    }

    #[test]
    fn parser_handles_multiple_frames_per_chunk() {
        let mut parser = EventFrameParser::default();
        let events = parser.push(
            "data: {\"status\":\"analyzing\",\"elapsed\":0}\n\n\
             data: {\"status\":\"complete\",\"solution\":\"{}\"}\n\n",
        );
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }

    #[test]
    fn parser_ignores_comments_and_garbage() {
        let mut parser = EventFrameParser::default();
        let events = parser.push(": keep-alive\n\ndata: not json\n\n");
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn analyze_parses_wrapped_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analysis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": r#"{"results":[{"kind":"Pod","name":"broken-image-pod","error":[{"Text":"ErrImagePull"}]}]}"#
            })))
            .mount(&server)
            .await;

        let report = DiagnosticsClient::new(&server.uri()).analyze().await.unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].name, "broken-image-pod");
    }

    #[tokio::test]
    async fn analyze_surfaces_agent_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analysis"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({ "error": "k8sgpt timed out after 30s" })),
            )
            .mount(&server)
            .await;

        let err = DiagnosticsClient::new(&server.uri())
            .analyze()
            .await
            .unwrap_err();
        match err {
            DiagnosticsError::Remote(message) => {
                assert_eq!(message, "k8sgpt timed out after 30s");
            }
            other => panic!("expected Remote, got {other}"),
        }
    }

    #[tokio::test]
    async fn stream_reports_progress_then_solution() {
        let server = MockServer::start().await;
        let body = "data: {\"status\":\"analyzing\",\"elapsed\":0}\n\n\
                    data: {\"status\":\"analyzing\",\"elapsed\":2}\n\n\
                    data: {\"status\":\"complete\",\"solution\":\"{\\\"results\\\":[]}\"}\n\n";
        Mock::given(method("POST"))
            .and(path("/solution/stream"))
            .and(body_partial_json(serde_json::json!({ "filter": "Pod" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let mut heartbeats = Vec::new();
        let solution = DiagnosticsClient::new(&server.uri())
            .stream_solution("Pod", |elapsed| heartbeats.push(elapsed))
            .await
            .unwrap();
        assert_eq!(heartbeats, [0, 2]);
        assert_eq!(solution, r#"{"results":[]}"#);
    }

    #[tokio::test]
    async fn stream_without_terminal_frame_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/solution/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"status\":\"analyzing\",\"elapsed\":0}\n\n",
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let err = DiagnosticsClient::new(&server.uri())
            .stream_solution("Pod", |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, DiagnosticsError::StreamTimedOut));
    }

    #[tokio::test]
    async fn stream_error_frame_is_a_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/solution/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"status\":\"error\",\"error\":\"backend unreachable\"}\n\n",
                "text/event-stream",
            ))
            .mount(&server)
            .await;

        let err = DiagnosticsClient::new(&server.uri())
            .stream_solution("Pod", |_| {})
            .await
            .unwrap_err();
        match err {
            DiagnosticsError::Remote(message) => assert_eq!(message, "backend unreachable"),
            other => panic!("expected Remote, got {other}"),
        }
    }
}
