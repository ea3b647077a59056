//! # Lesson Memory
//!
//! Long-term memory of design lessons, keyed by use case. Lessons written
//! by one run are read by every later run for the same use case, so designs
//! improve across sessions.

mod lesson_store;

pub use lesson_store::JsonLessonStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRecord {
    pub lesson: String,
    pub created_at: DateTime<Utc>,
}

/// All lessons recorded for one use case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseCaseLessons {
    pub use_case_id: String,
    pub use_case_name: String,
    pub lessons: Vec<LessonRecord>,
}

impl UseCaseLessons {
    pub fn empty(use_case_id: impl Into<String>, use_case_name: impl Into<String>) -> Self {
        Self {
            use_case_id: use_case_id.into(),
            use_case_name: use_case_name.into(),
            lessons: Vec::new(),
        }
    }
}

/// Persistent store of lessons, keyed by use case identifier.
///
/// Reads never modify the store; only `add_lessons` writes to disk.
#[async_trait]
pub trait LessonMemory: Send + Sync {
    /// Lessons recorded for a use case, oldest first. Unknown use cases
    /// yield an empty list.
    async fn get_lessons(&self, use_case_id: &str) -> anyhow::Result<Vec<LessonRecord>>;

    /// Append one lesson for a use case and persist immediately.
    async fn add_lesson(
        &self,
        use_case_id: &str,
        use_case_name: &str,
        text: &str,
    ) -> anyhow::Result<()>;

    /// Snapshot of the whole store, for inspection endpoints
    async fn all(&self) -> anyhow::Result<Vec<UseCaseLessons>>;

    /// Remove every stored lesson
    async fn clear(&self) -> anyhow::Result<()>;
}

/// Normalize one raw lesson line from critic output.
///
/// Strips list markers (digits, dots, dashes, parens) from the front and
/// surrounding whitespace. Returns `None` for lines that are empty after
/// cleanup.
pub fn clean_lesson_line(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim_start_matches(|c: char| "0123456789.-) ".contains(c))
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_lesson_line_strips_markers() {
        assert_eq!(
            clean_lesson_line("1. Always define agent boundaries").as_deref(),
            Some("Always define agent boundaries")
        );
        assert_eq!(
            clean_lesson_line("- include latency budgets").as_deref(),
            Some("include latency budgets")
        );
        assert_eq!(
            clean_lesson_line("2) validate tool schemas").as_deref(),
            Some("validate tool schemas")
        );
    }

    #[test]
    fn test_clean_lesson_line_rejects_blank_lines() {
        assert_eq!(clean_lesson_line(""), None);
        assert_eq!(clean_lesson_line("   "), None);
        assert_eq!(clean_lesson_line("3. "), None);
        assert_eq!(clean_lesson_line("---"), None);
    }

    #[test]
    fn test_clean_lesson_line_keeps_interior_punctuation() {
        assert_eq!(
            clean_lesson_line("10. Use 5G QoS classes (see 3GPP)").as_deref(),
            Some("Use 5G QoS classes (see 3GPP)")
        );
    }
}
