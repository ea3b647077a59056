//! # Workflow Skills
//!
//! The three LLM-backed steps of the design workflow, their prompt
//! templates, and the tools they may invoke.

pub mod classifier_skill;
pub mod critic_skill;
pub mod designer_skill;
pub mod prompts;
pub mod tools;

pub use classifier_skill::ClassifierSkill;
pub use critic_skill::{verdict_is_approved, CriticSkill};
pub use designer_skill::DesignerSkill;
