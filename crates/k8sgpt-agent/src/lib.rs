//! K8sGPT diagnostics agent.
//!
//! Wraps the `k8sgpt` CLI behind a small HTTP facade so the rest of the
//! harness can trigger cluster analysis over the wire. Three operations are
//! exposed: a quick un-explained scan, a synchronous AI-explained solution
//! lookup, and a streaming variant of the latter that emits progress
//! heartbeats while the CLI runs.
//!
//! Nothing here interprets the CLI's JSON output; payloads are passed
//! through opaquely and consumers decide what to make of them.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analyzer;
pub mod config;
pub mod server;
pub mod stream;

pub use analyzer::{AnalyzerError, ClusterAnalyzer, K8sgptRunner, EMPTY_RESULTS};
pub use config::AgentConfig;
pub use server::build_router;
pub use stream::solution_stream;
