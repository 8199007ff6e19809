//! Progress streaming around a long-running explained analysis.
//!
//! The explained k8sgpt invocation can take minutes, so callers that want
//! liveness get a stream instead of a blocking join: `analyzing` heartbeats
//! at a fixed cadence while the invocation runs on a background task, then
//! exactly one terminal frame. If the budget elapses first the stream ends
//! with no terminal frame at all, which callers must read as a timeout.
//!
//! The background task's `JoinHandle` is the only synchronization point;
//! its result cannot be observed before the task has written it. Dropping
//! the stream aborts the task, and the invoker spawns the CLI with
//! kill-on-drop, so a consumer that disconnects mid-stream also reaps the
//! child process.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use protocol::SolutionEvent;

use crate::analyzer::{AnalyzerError, ClusterAnalyzer};

/// Aborts the analysis task if the stream is dropped before it finishes.
struct AbortOnDrop(JoinHandle<Result<String, AnalyzerError>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run an explained analysis in the background, yielding progress frames
/// until it completes or `budget` elapses.
///
/// Frames are [`SolutionEvent::Analyzing`] every `interval` (the first
/// fires immediately with elapsed 0), followed by exactly one of
/// [`SolutionEvent::Complete`] or [`SolutionEvent::Error`] — unless the
/// budget runs out, in which case the stream simply ends.
pub fn solution_stream(
    analyzer: Arc<dyn ClusterAnalyzer>,
    filter: Option<String>,
    budget: Duration,
    interval: Duration,
) -> impl Stream<Item = SolutionEvent> + Send {
    stream! {
        let task = tokio::spawn(async move {
            analyzer.explain(filter.as_deref()).await
        });
        let mut task = AbortOnDrop(task);

        let started = tokio::time::Instant::now();
        let mut ticks = tokio::time::interval(interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let (event, done) = tokio::select! {
                result = &mut task.0 => {
                    let event = match result {
                        Ok(Ok(solution)) => {
                            debug!(bytes = solution.len(), "analysis complete");
                            SolutionEvent::Complete { solution }
                        }
                        Ok(Err(err)) => {
                            warn!(error = %err, "analysis failed");
                            SolutionEvent::Error { error: err.to_string() }
                        }
                        Err(join_err) => {
                            warn!(error = %join_err, "analysis task died");
                            SolutionEvent::Error {
                                error: format!("analysis task failed: {join_err}"),
                            }
                        }
                    };
                    (Some(event), true)
                }
                _ = ticks.tick() => {
                    let elapsed = started.elapsed();
                    if elapsed >= budget {
                        warn!(budget_secs = budget.as_secs(), "analysis budget exhausted, ending stream");
                        (None, true)
                    } else {
                        (Some(SolutionEvent::Analyzing { elapsed: elapsed.as_secs() }), false)
                    }
                }
            };

            if let Some(event) = event {
                yield event;
            }
            if done {
                break;
            }
        }
    }
}
