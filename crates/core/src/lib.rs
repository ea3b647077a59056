//! # Blueprint Core
//!
//! The "Brain" of the Blueprint system - designs AI multi-agent system
//! proposals for telecom use cases by driving three LLM-backed roles
//! (classifier, designer, critic) through a bounded feedback loop.
//!
//! ## Architecture
//!
//! - `skills/` - Workflow skills (ClassifierSkill, DesignerSkill, CriticSkill)
//! - `catalog/` - The closed enumeration of telecom use cases
//! - `llm/` - Text generation and embedding collaborator contracts
//! - `memory/` - Long-term lesson memory, persisted across runs
//! - `retrieval/` - Use-case document chunk search
//! - `workflow/` - The state machine that sequences the skills
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blueprint_core::workflow::{Workflow, WorkflowConfig, WorkflowServices};
//!
//! let workflow = Workflow::new(WorkflowConfig::default(), services);
//! let state = workflow.run("Design a system for the smart life use case").await;
//! ```

pub mod catalog;
pub mod llm;
pub mod memory;
pub mod models;
pub mod retrieval;
pub mod skills;
pub mod workflow;

#[cfg(test)]
pub mod testing;
