//! # Designer Tools
//!
//! External capabilities the designer may invoke while drafting a design.

mod research_tool;

pub use research_tool::{Researcher, WebResearchTool};
