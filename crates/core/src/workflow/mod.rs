//! # Design Workflow
//!
//! The bounded state machine driving classifier, designer, and critic.

pub mod controller;
pub mod events;
pub mod state;

pub use controller::{run_design_workflow, Workflow, WorkflowConfig, WorkflowServices};
pub use events::{WorkflowEvent, WorkflowEventKind};
pub use state::{StatePatch, WorkflowPhase, WorkflowState};
