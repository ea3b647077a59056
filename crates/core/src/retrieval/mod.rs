//! # Document Retrieval
//!
//! Search over the chunked ETSI use case document. The classifier pulls a
//! use case's Description and Requirements chunks through this seam.

mod chunk_store;

pub use chunk_store::SqliteChunkStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::UseCaseCategory;

/// Which numbered subsection a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    /// 5.x.x.1 subsections
    Description,
    /// 5.x.x.2 subsections
    Requirements,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Description => "description",
            SectionType::Requirements => "requirements",
        }
    }
}

/// One chunk of the source document, with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub chunk_id: String,
    pub content: String,
    pub use_case_id: String,
    pub use_case_name: String,
    pub section_type: SectionType,
    pub category: UseCaseCategory,
    /// Position of this chunk within its section, for reassembly order
    pub chunk_index: u32,
}

/// Chunk search capability
#[async_trait]
pub trait ChunkRetriever: Send + Sync {
    /// Top-`k` chunks for `query`, optionally filtered to one use case and
    /// one section type.
    async fn search(
        &self,
        query: &str,
        k: usize,
        use_case_id: Option<&str>,
        section_type: Option<SectionType>,
    ) -> anyhow::Result<Vec<DocumentChunk>>;
}

/// Reassemble retrieved chunks into one text block, in document order.
pub fn join_chunks(mut chunks: Vec<DocumentChunk>) -> String {
    chunks.sort_by_key(|c| c.chunk_index);
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
