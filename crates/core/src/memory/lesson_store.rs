//! # JSON Lesson Store
//!
//! File-backed [`LessonMemory`] implementation. The whole store is one JSON
//! document mapping use case id to its lessons; every write rewrites the
//! file. A mutex serializes writers so concurrent runs cannot interleave
//! partial states.

use anyhow::Context;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{LessonMemory, LessonRecord, UseCaseLessons};

/// JSON-file-backed lesson memory
pub struct JsonLessonStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, UseCaseLessons>>,
}

impl JsonLessonStore {
    /// Open a store at `path`, loading existing lessons if the file exists.
    pub fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read lesson store at {}", path.display()))?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("corrupt lesson store at {}", path.display()))?
            }
        } else {
            HashMap::new()
        };

        info!(path = %path.display(), use_cases = entries.len(), "lesson store opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &HashMap<String, UseCaseLessons>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(entries).context("failed to encode lessons")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("failed to write lesson store at {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl LessonMemory for JsonLessonStore {
    async fn get_lessons(&self, use_case_id: &str) -> anyhow::Result<Vec<LessonRecord>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .get(use_case_id)
            .map(|e| e.lessons.clone())
            .unwrap_or_default())
    }

    async fn add_lesson(
        &self,
        use_case_id: &str,
        use_case_name: &str,
        text: &str,
    ) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .entry(use_case_id.to_string())
            .or_insert_with(|| UseCaseLessons::empty(use_case_id, use_case_name));
        entry.lessons.push(LessonRecord {
            lesson: text.to_string(),
            created_at: Utc::now(),
        });

        self.persist(&entries).await?;
        debug!(use_case_id, "lesson recorded");
        Ok(())
    }

    async fn all(&self) -> anyhow::Result<Vec<UseCaseLessons>> {
        let entries = self.entries.lock().await;
        let mut all: Vec<UseCaseLessons> = entries.values().cloned().collect();
        all.sort_by(|a, b| a.use_case_id.cmp(&b.use_case_id));
        Ok(all)
    }

    async fn clear(&self) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.persist(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("blueprint_lessons_{}_{}.json", label, nanos))
    }

    #[tokio::test]
    async fn test_add_and_get_lessons() {
        let path = temp_store_path("add_get");
        let store = JsonLessonStore::new(&path).unwrap();

        store
            .add_lesson(
                "5.1.1",
                "AI Agents to Enable Smart Life",
                "Define agent roles early",
            )
            .await
            .unwrap();

        let lessons = store.get_lessons("5.1.1").await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].lesson, "Define agent roles early");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_get_unknown_use_case_is_empty_and_does_not_write() {
        let path = temp_store_path("lazy_get");
        let store = JsonLessonStore::new(&path).unwrap();

        let first = store.get_lessons("5.3.2").await.unwrap();
        let second = store.get_lessons("5.3.2").await.unwrap();
        assert!(first.is_empty());
        assert_eq!(first.len(), second.len());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_lessons_are_isolated_per_use_case() {
        let path = temp_store_path("isolation");
        let store = JsonLessonStore::new(&path).unwrap();

        store
            .add_lesson("5.1.1", "AI Agents to Enable Smart Life", "a")
            .await
            .unwrap();
        store
            .add_lesson("5.2.1", "Smart City Traffic Monitoring", "b")
            .await
            .unwrap();

        let smart_life = store.get_lessons("5.1.1").await.unwrap();
        let traffic = store.get_lessons("5.2.1").await.unwrap();
        assert_eq!(smart_life.len(), 1);
        assert_eq!(traffic.len(), 1);
        assert_eq!(smart_life[0].lesson, "a");
        assert_eq!(traffic[0].lesson, "b");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_lessons_survive_reopen() {
        let path = temp_store_path("reopen");
        {
            let store = JsonLessonStore::new(&path).unwrap();
            store
                .add_lesson("5.3.1", "Autonomous Network Management", "persist me")
                .await
                .unwrap();
        }

        let reopened = JsonLessonStore::new(&path).unwrap();
        let lessons = reopened.get_lessons("5.3.1").await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].lesson, "persist me");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let path = temp_store_path("clear");
        let store = JsonLessonStore::new(&path).unwrap();
        store.add_lesson("5.1.3", "AI Phone", "x").await.unwrap();

        store.clear().await.unwrap();
        assert!(store.get_lessons("5.1.3").await.unwrap().is_empty());
        assert!(store.all().await.unwrap().is_empty());

        std::fs::remove_file(&path).ok();
    }
}
