//! # Classifier Skill
//!
//! Resolves a free-text request to one use case from the catalog, pulls that
//! use case's description and requirement text, and condenses the description
//! into a short technical summary.
//!
//! Identity resolution is nearest-neighbour matching between the query
//! embedding and a precomputed embedding of each catalog name. There is no
//! confidence threshold; the best match always wins, with ties going to the
//! earlier catalog entry.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::catalog::{UseCase, USE_CASES};
use crate::llm::{cosine_similarity, ChatMessage, Embedder, TextGenerator};
use crate::retrieval::{join_chunks, ChunkRetriever, SectionType};
use crate::skills::prompts;
use crate::workflow::{StatePatch, WorkflowState};

/// How many chunks to pull per content kind
const RETRIEVAL_K: usize = 10;

/// Classifier step of the design workflow
pub struct ClassifierSkill {
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn ChunkRetriever>,
    llm: Arc<dyn TextGenerator>,
    name_embeddings: OnceCell<Vec<Vec<f32>>>,
}

impl ClassifierSkill {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retriever: Arc<dyn ChunkRetriever>,
        llm: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            embedder,
            retriever,
            llm,
            name_embeddings: OnceCell::new(),
        }
    }

    /// Resolve the query to the catalog entry whose name embedding is
    /// nearest to the query embedding.
    async fn resolve_use_case(&self, query: &str) -> anyhow::Result<Option<&'static UseCase>> {
        let query_embedding = self.embedder.embed(query).await?;

        let name_embeddings = self
            .name_embeddings
            .get_or_try_init(|| async {
                let mut embeddings = Vec::with_capacity(USE_CASES.len());
                for use_case in USE_CASES {
                    embeddings.push(self.embedder.embed(use_case.name).await?);
                }
                Ok::<_, crate::llm::LlmError>(embeddings)
            })
            .await?;

        let mut best: Option<(f32, &'static UseCase)> = None;
        for (use_case, embedding) in USE_CASES.iter().zip(name_embeddings) {
            let score = cosine_similarity(&query_embedding, embedding);
            // strict comparison keeps the earlier entry on ties
            if best.map_or(true, |(b, _)| score > b) {
                best = Some((score, use_case));
            }
        }
        Ok(best.map(|(_, uc)| uc))
    }

    /// Run the classifier against the current state.
    pub async fn run(&self, state: &WorkflowState) -> StatePatch {
        let user_query = state.user_query.trim();
        if user_query.is_empty() {
            return StatePatch::failed("Classifier requires a non-empty user query");
        }

        let use_case = match self.resolve_use_case(user_query).await {
            Ok(Some(uc)) => uc,
            Ok(None) => {
                warn!(user_query, "query did not resolve to any use case");
                return StatePatch::failed("Could not identify a valid use case from query");
            }
            Err(e) => return StatePatch::failed(format!("Query analysis failed: {}", e)),
        };
        info!(use_case_id = use_case.id, "use case resolved");

        let description_chunks = match self
            .retriever
            .search(user_query, RETRIEVAL_K, Some(use_case.id), Some(SectionType::Description))
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => return StatePatch::failed(format!("Query analysis failed: {}", e)),
        };
        if description_chunks.is_empty() {
            return StatePatch {
                use_case_id: Some(use_case.id.to_string()),
                use_case_name: Some(use_case.name.to_string()),
                error: Some(format!("No description found for use case {}", use_case.id)),
                ..Default::default()
            };
        }

        let requirement_chunks = match self
            .retriever
            .search(user_query, RETRIEVAL_K, Some(use_case.id), Some(SectionType::Requirements))
            .await
        {
            Ok(chunks) => chunks,
            Err(e) => return StatePatch::failed(format!("Query analysis failed: {}", e)),
        };
        if requirement_chunks.is_empty() {
            return StatePatch {
                use_case_id: Some(use_case.id.to_string()),
                use_case_name: Some(use_case.name.to_string()),
                error: Some(format!("No requirement found for use case {}", use_case.id)),
                ..Default::default()
            };
        }

        let description_text = join_chunks(description_chunks);
        let requirement_text = join_chunks(requirement_chunks);

        let messages = [
            ChatMessage::system(prompts::CLASSIFIER_SUMMARY),
            ChatMessage::user(format!(
                "Use Case: {}\n\nDescription:\n{}\n\nProvide a concise summary:",
                use_case.name, description_text
            )),
        ];
        let summary = match self.llm.generate(&messages).await {
            Ok(summary) => summary,
            Err(e) => return StatePatch::failed(format!("Query analysis failed: {}", e)),
        };

        StatePatch {
            use_case_id: Some(use_case.id.to_string()),
            use_case_name: Some(use_case.name.to_string()),
            description_summary: Some(summary),
            requirement_list: Some(requirement_text),
            ..Default::default()
        }
    }
}
