//! # Workflow State
//!
//! The single record threaded through a design run, plus the typed patch
//! each step returns. Steps never mutate state in place; the controller
//! applies patches and hands the new version to the next step.

use serde::{Deserialize, Serialize};

/// Phase of the design state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Classifying,
    Designing,
    Critiquing,
    Terminated,
}

/// Shared state for one design run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The original request, immutable once set
    pub user_query: String,
    /// Resolved use case identity, written once by the classifier
    pub use_case_id: Option<String>,
    pub use_case_name: Option<String>,
    /// Condensed retrieval outputs, written once by the classifier
    pub description_summary: Option<String>,
    pub requirement_list: Option<String>,
    /// Research provenance, rewritten each designer invocation
    pub research_notes: Option<String>,
    /// Current candidate design, overwritten each designer invocation
    pub system_design: Option<String>,
    /// Most recent critic verdict text
    pub feedback: Option<String>,
    /// Terminal signal; true means stop iterating
    pub is_approved: bool,
    /// Increments once per critic invocation
    pub iteration: u32,
    pub max_iterations: u32,
    /// Non-null only once the run reached a terminal report
    pub final_response: Option<String>,
    /// Set by any step on failure; halts the state machine
    pub error: Option<String>,
}

impl WorkflowState {
    /// Fresh state for a new run
    pub fn new(user_query: impl Into<String>, max_iterations: u32) -> Self {
        Self {
            user_query: user_query.into(),
            use_case_id: None,
            use_case_name: None,
            description_summary: None,
            requirement_list: None,
            research_notes: None,
            system_design: None,
            feedback: None,
            is_approved: false,
            iteration: 0,
            max_iterations,
            final_response: None,
            error: None,
        }
    }

    /// Apply a step's patch, producing the next state version.
    ///
    /// Optional fields replace the old value only when the patch carries
    /// one. `error` is carried over verbatim from the patch so a step's
    /// outcome always decides it.
    pub fn apply(&self, patch: StatePatch) -> Self {
        let mut next = self.clone();
        if let Some(v) = patch.use_case_id {
            next.use_case_id = Some(v);
        }
        if let Some(v) = patch.use_case_name {
            next.use_case_name = Some(v);
        }
        if let Some(v) = patch.description_summary {
            next.description_summary = Some(v);
        }
        if let Some(v) = patch.requirement_list {
            next.requirement_list = Some(v);
        }
        if let Some(v) = patch.research_notes {
            next.research_notes = Some(v);
        }
        if let Some(v) = patch.system_design {
            next.system_design = Some(v);
        }
        if let Some(v) = patch.feedback {
            next.feedback = Some(v);
        }
        if let Some(v) = patch.is_approved {
            next.is_approved = v;
        }
        if let Some(v) = patch.iteration {
            next.iteration = v;
        }
        if let Some(v) = patch.final_response {
            next.final_response = Some(v);
        }
        next.error = patch.error;
        next
    }

    /// True once the run can no longer advance
    pub fn is_terminal(&self) -> bool {
        self.error.is_some() || self.is_approved || self.final_response.is_some()
    }
}

/// Typed partial update returned by each workflow step
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub use_case_id: Option<String>,
    pub use_case_name: Option<String>,
    pub description_summary: Option<String>,
    pub requirement_list: Option<String>,
    pub research_notes: Option<String>,
    pub system_design: Option<String>,
    pub feedback: Option<String>,
    pub is_approved: Option<bool>,
    pub iteration: Option<u32>,
    pub final_response: Option<String>,
    pub error: Option<String>,
}

impl StatePatch {
    /// A patch that only reports a step failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}
