//! # Workflow Events
//!
//! Progress events emitted while a design run advances. Consumers (the
//! server's task registry, the CLI) subscribe through an mpsc channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of workflow event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEventKind {
    /// Run started
    WorkflowStarted,
    /// A step started working
    StepStarted,
    /// A step completed successfully
    StepCompleted,
    /// A step reported an error
    StepFailed,
    /// Critic asked for revision, looping back to the designer
    RevisionRequested,
    /// Run reached a terminal report
    WorkflowCompleted,
    /// Run terminated on error
    WorkflowFailed,
}

/// An event emitted by the workflow controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    /// Unique event ID
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: WorkflowEventKind,
    /// Step that produced this event ("classifier", "designer", "critic", "controller")
    pub step: String,
    /// Associated data (JSON)
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl WorkflowEvent {
    pub fn new(kind: WorkflowEventKind, step: &str) -> Self {
        Self {
            id: uuid_v4(),
            timestamp: Utc::now(),
            kind,
            step: step.to_string(),
            data: None,
        }
    }

    /// Add data to the event
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Generate a simple UUID v4
fn uuid_v4() -> String {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos();
    format!("{:x}-{:x}", nanos, rand_u32())
}

/// Simple random number (not cryptographic)
fn rand_u32() -> u32 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    RandomState::new().build_hasher().finish() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_creation() {
        let event = WorkflowEvent::new(WorkflowEventKind::StepStarted, "designer")
            .with_data(serde_json::json!({"iteration": 1}));

        assert_eq!(event.step, "designer");
        assert_eq!(event.kind, WorkflowEventKind::StepStarted);
        assert!(event.data.is_some());
    }

    #[test]
    fn test_event_ids_differ() {
        let a = WorkflowEvent::new(WorkflowEventKind::WorkflowStarted, "controller");
        let b = WorkflowEvent::new(WorkflowEventKind::WorkflowStarted, "controller");
        assert_ne!(a.id, b.id);
    }
}
