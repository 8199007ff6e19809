//! Shared wire types for the incident-workflow harness.
//!
//! Every agent in the harness serves a static capability descriptor (the
//! "agent card") at a well-known path so peers can discover what it offers,
//! and the diagnostics agent streams [`SolutionEvent`] frames while a
//! long-running analysis is in flight. Both sides of those exchanges live
//! here so servers and clients agree on the shapes.

use serde::{Deserialize, Serialize};

/// Well-known path where every agent serves its capability descriptor.
pub const AGENT_CARD_PATH: &str = "/.well-known/agent-card.json";

/// Static capability descriptor for an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    /// Agent name, e.g. `k8sgpt_agent`
    pub name: String,
    /// Human-readable description of what the agent does
    pub description: String,
    /// Base URL the agent is reachable at
    pub url: String,
    /// Operations the agent exposes
    pub skills: Vec<AgentSkill>,
}

/// A single operation advertised on an [`AgentCard`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSkill {
    /// Skill name, e.g. `get_solution`
    pub name: String,
    /// What the skill does
    pub description: String,
}

impl AgentSkill {
    /// Convenience constructor.
    #[must_use]
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// A single frame on the solution progress stream.
///
/// While the diagnostics CLI is running, the stream carries `analyzing`
/// heartbeats with the elapsed-seconds counter; once the invocation
/// finishes the stream carries exactly one terminal frame, either
/// `complete` or `error`. A stream that ends without a terminal frame
/// means the invocation outlived its budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SolutionEvent {
    /// Heartbeat emitted while the invocation is still running
    Analyzing {
        /// Seconds since the invocation started
        elapsed: u64,
    },
    /// Terminal frame: the invocation produced a solution payload
    Complete {
        /// Opaque solution text (expected to be JSON, but not interpreted)
        solution: String,
    },
    /// Terminal frame: the invocation failed
    Error {
        /// Failure description
        error: String,
    },
}

impl SolutionEvent {
    /// Whether this frame ends the stream.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyzing_frame_shape() {
        let json = serde_json::to_string(&SolutionEvent::Analyzing { elapsed: 6 }).unwrap();
        assert_eq!(json, r#"{"status":"analyzing","elapsed":6}"#);
    }

    #[test]
    fn error_frame_shape() {
        let json = serde_json::to_string(&SolutionEvent::Error {
            error: "analysis timed out".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"error","error":"analysis timed out"}"#);
    }

    #[test]
    fn complete_round_trips_payload_unchanged() {
        // The solution payload is itself JSON text; encoding it as a JSON
        // string literal and decoding must give back the identical text.
        let payload = r#"{"results":[{"kind":"Pod","name":"broken-image-pod"}]}"#;
        let json = serde_json::to_string(&SolutionEvent::Complete {
            solution: payload.to_string(),
        })
        .unwrap();
        assert!(json.starts_with(r#"{"status":"complete","solution":"#));

        match serde_json::from_str::<SolutionEvent>(&json).unwrap() {
            SolutionEvent::Complete { solution } => assert_eq!(solution, payload),
            other => panic!("expected complete frame, got {other:?}"),
        }
    }

    #[test]
    fn agent_card_serializes() {
        let card = AgentCard {
            name: "k8sgpt_agent".to_string(),
            description: "K8sGPT agent for cluster analysis".to_string(),
            url: "http://localhost:8002".to_string(),
            skills: vec![AgentSkill::new("analyze_cluster", "Analyze cluster")],
        };
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["skills"][0]["name"], "analyze_cluster");
    }

    #[test]
    fn terminal_classification() {
        assert!(!SolutionEvent::Analyzing { elapsed: 0 }.is_terminal());
        assert!(SolutionEvent::Complete {
            solution: String::new()
        }
        .is_terminal());
        assert!(SolutionEvent::Error {
            error: String::new()
        }
        .is_terminal());
    }
}
