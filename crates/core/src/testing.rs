//! Shared test doubles for the workflow's collaborator seams.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::catalog::UseCaseCategory;
use crate::llm::{
    ChatMessage, Embedder, GenerationTurn, LlmError, Result as LlmResult, Role, TextGenerator,
    ToolCall, ToolDefinition,
};
use crate::retrieval::{ChunkRetriever, DocumentChunk, SectionType};
use crate::skills::tools::Researcher;

/// Unique temp path for a throwaway lesson store
pub fn temp_lesson_path(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("blueprint_test_{}_{}.json", label, nanos))
}

/// Generator that always answers with the same text
pub struct FixedGenerator {
    response: String,
}

impl FixedGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _messages: &[ChatMessage]) -> LlmResult<String> {
        Ok(self.response.clone())
    }

    async fn generate_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> LlmResult<GenerationTurn> {
        Ok(GenerationTurn {
            content: Some(self.response.clone()),
            tool_calls: Vec::new(),
        })
    }
}

/// Generator that always fails
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _messages: &[ChatMessage]) -> LlmResult<String> {
        Err(LlmError::Api("generator unavailable".to_string()))
    }

    async fn generate_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> LlmResult<GenerationTurn> {
        Err(LlmError::Api("generator unavailable".to_string()))
    }
}

/// One pre-scripted assistant turn
#[derive(Clone)]
pub struct ScriptedTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ScriptedTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            content: None,
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }

    pub fn text_with_tool_call(content: &str, id: &str, name: &str, arguments: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }
}

/// Generator that replays a fixed script of turns and records prompts
pub struct ScriptedGenerator {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    user_prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(turns: Vec<ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            user_prompts: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, messages: &[ChatMessage]) {
        if let Some(user) = messages.iter().rev().find(|m| m.role == Role::User) {
            self.user_prompts.lock().unwrap().push(user.content.clone());
        }
    }

    fn next_turn(&self) -> LlmResult<ScriptedTurn> {
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Api("script exhausted".to_string()))
    }

    /// The user prompt from the most recent call
    pub fn last_user_prompt(&self) -> String {
        self.user_prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> LlmResult<String> {
        self.record(messages);
        Ok(self.next_turn()?.content.unwrap_or_default())
    }

    async fn generate_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> LlmResult<GenerationTurn> {
        self.record(messages);
        let turn = self.next_turn()?;
        Ok(GenerationTurn {
            content: turn.content,
            tool_calls: turn.tool_calls,
        })
    }
}

/// Embedder with a fixed default vector and optional exact-text overrides
pub struct StubEmbedder {
    default: Vec<f32>,
    by_text: HashMap<String, Vec<f32>>,
}

impl StubEmbedder {
    pub fn new(default: Vec<f32>) -> Self {
        Self {
            default,
            by_text: HashMap::new(),
        }
    }

    pub fn with_text(mut self, text: &str, embedding: Vec<f32>) -> Self {
        self.by_text.insert(text.to_string(), embedding);
        self
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> LlmResult<Vec<f32>> {
        Ok(self
            .by_text
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}

/// Embedder that always fails
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> LlmResult<Vec<f32>> {
        Err(LlmError::Api("embedding service unavailable".to_string()))
    }
}

/// Retriever that serves canned chunks for one use case
pub struct StubRetriever {
    use_case_id: String,
}

impl StubRetriever {
    pub fn for_use_case(use_case_id: &str) -> Self {
        Self {
            use_case_id: use_case_id.to_string(),
        }
    }
}

#[async_trait]
impl ChunkRetriever for StubRetriever {
    async fn search(
        &self,
        _query: &str,
        _k: usize,
        use_case_id: Option<&str>,
        section_type: Option<SectionType>,
    ) -> anyhow::Result<Vec<DocumentChunk>> {
        if let Some(requested) = use_case_id {
            if requested != self.use_case_id {
                return Ok(Vec::new());
            }
        }
        let section = section_type.unwrap_or(SectionType::Description);
        // out of order on purpose; callers re-sort on chunk_index
        Ok(vec![
            DocumentChunk {
                chunk_id: format!("{}-{}-1", self.use_case_id, section.as_str()),
                content: format!("{} part two", section.as_str()),
                use_case_id: self.use_case_id.clone(),
                use_case_name: "stub".to_string(),
                section_type: section,
                category: UseCaseCategory::Consumer,
                chunk_index: 1,
            },
            DocumentChunk {
                chunk_id: format!("{}-{}-0", self.use_case_id, section.as_str()),
                content: format!("{} part one", section.as_str()),
                use_case_id: self.use_case_id.clone(),
                use_case_name: "stub".to_string(),
                section_type: section,
                category: UseCaseCategory::Consumer,
                chunk_index: 0,
            },
        ])
    }
}

/// Retriever that never finds anything
pub struct EmptyRetriever;

#[async_trait]
impl ChunkRetriever for EmptyRetriever {
    async fn search(
        &self,
        _query: &str,
        _k: usize,
        _use_case_id: Option<&str>,
        _section_type: Option<SectionType>,
    ) -> anyhow::Result<Vec<DocumentChunk>> {
        Ok(Vec::new())
    }
}

/// Researcher for flows where research is never expected
pub struct NoopResearcher;

#[async_trait]
impl Researcher for NoopResearcher {
    async fn research(&self, _query: &str, _focus: &str) -> anyhow::Result<String> {
        Ok("No search results found.".to_string())
    }
}

/// Researcher that returns a fixed summary
pub struct StubResearcher {
    summary: String,
}

impl StubResearcher {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

#[async_trait]
impl Researcher for StubResearcher {
    async fn research(&self, _query: &str, _focus: &str) -> anyhow::Result<String> {
        Ok(self.summary.clone())
    }
}
