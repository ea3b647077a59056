//! # SQLite Chunk Store
//!
//! Persistent chunk storage with keyword-overlap ranking. Candidate rows are
//! narrowed in SQL by metadata filters, then scored in memory against the
//! query terms.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::{ChunkRetriever, DocumentChunk, SectionType};
use crate::catalog::UseCaseCategory;

/// SQLite-backed chunk store
pub struct SqliteChunkStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteChunkStore {
    /// Open (or create) a chunk database at `path`
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("failed to open chunk db at {}", path.as_ref().display()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, used by tests and ingestion dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory chunk db")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                use_case_id TEXT NOT NULL,
                use_case_name TEXT NOT NULL,
                section_type TEXT NOT NULL,
                category TEXT NOT NULL,
                chunk_index INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_chunks_use_case ON chunks(use_case_id, section_type);
            "#,
        )
        .context("failed to initialize chunk schema")?;
        Ok(())
    }

    /// Insert or replace chunks
    pub fn add_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let tx = conn.transaction()?;
        for chunk in chunks {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                    (chunk_id, content, use_case_id, use_case_name, section_type, category, chunk_index)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    chunk.chunk_id,
                    chunk.content,
                    chunk.use_case_id,
                    chunk.use_case_name,
                    chunk.section_type.as_str(),
                    chunk.category.as_str(),
                    chunk.chunk_index,
                ],
            )
            .context("failed to insert chunk")?;
        }
        tx.commit()?;
        Ok(chunks.len())
    }

    /// Number of stored chunks
    pub fn count(&self) -> Result<i64> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count)
    }

    fn candidates(
        &self,
        use_case_id: Option<&str>,
        section_type: Option<SectionType>,
    ) -> Result<Vec<DocumentChunk>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let mut sql = String::from(
            "SELECT chunk_id, content, use_case_id, use_case_name, section_type, category, chunk_index FROM chunks WHERE 1=1",
        );
        let mut bound: Vec<String> = Vec::new();
        if let Some(id) = use_case_id {
            sql.push_str(&format!(" AND use_case_id = ?{}", bound.len() + 1));
            bound.push(id.to_string());
        }
        if let Some(section) = section_type {
            sql.push_str(&format!(" AND section_type = ?{}", bound.len() + 1));
            bound.push(section.as_str().to_string());
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(bound.iter()), |row| {
                let section: String = row.get(4)?;
                let category: String = row.get(5)?;
                Ok(DocumentChunk {
                    chunk_id: row.get(0)?,
                    content: row.get(1)?,
                    use_case_id: row.get(2)?,
                    use_case_name: row.get(3)?,
                    section_type: if section == "requirements" {
                        SectionType::Requirements
                    } else {
                        SectionType::Description
                    },
                    category: match category.as_str() {
                        "business" => UseCaseCategory::Business,
                        "operator" => UseCaseCategory::Operator,
                        _ => UseCaseCategory::Consumer,
                    },
                    chunk_index: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to collect chunks")?;
        Ok(rows)
    }
}

/// Score a chunk by how many distinct query terms appear in it
fn overlap_score(content: &str, terms: &HashSet<String>) -> usize {
    let lower = content.to_lowercase();
    terms.iter().filter(|t| lower.contains(t.as_str())).count()
}

fn query_terms(query: &str) -> HashSet<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_string())
        .collect()
}

#[async_trait::async_trait]
impl ChunkRetriever for SqliteChunkStore {
    async fn search(
        &self,
        query: &str,
        k: usize,
        use_case_id: Option<&str>,
        section_type: Option<SectionType>,
    ) -> anyhow::Result<Vec<DocumentChunk>> {
        let terms = query_terms(query);
        let mut scored: Vec<(usize, DocumentChunk)> = self
            .candidates(use_case_id, section_type)?
            .into_iter()
            .map(|c| (overlap_score(&c.content, &terms), c))
            .filter(|(score, _)| *score > 0 || terms.is_empty())
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.chunk_index.cmp(&b.1.chunk_index)));
        scored.truncate(k);
        debug!(query, hits = scored.len(), "chunk search");
        Ok(scored.into_iter().map(|(_, c)| c).collect())
    }
}
