//! Default prompt templates bundled at compile time.

/// Classifier - condenses use case descriptions into a technical summary
pub const CLASSIFIER_SUMMARY: &str = include_str!("defaults/classifier_summary.md");

/// Designer - architects a multi-agent system for a telecom use case
pub const DESIGNER: &str = include_str!("defaults/designer.md");

/// Critic - evaluates a design against requirements and renders a verdict
pub const CRITIC: &str = include_str!("defaults/critic.md");

/// Lesson extractor - distills reusable lessons from a finalized design
pub const LESSONS: &str = include_str!("defaults/lessons.md");

/// Research summarizer - condenses web search results into findings
pub const RESEARCH_SUMMARIZER: &str = include_str!("defaults/research_summarizer.md");

/// All default prompts with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("classifier_summary", CLASSIFIER_SUMMARY),
        ("designer", DESIGNER),
        ("critic", CRITIC),
        ("lessons", LESSONS),
        ("research_summarizer", RESEARCH_SUMMARIZER),
    ]
}
