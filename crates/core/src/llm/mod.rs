//! # LLM Collaborator Contracts
//!
//! Chat message types and the trait seams the workflow talks through.
//! The production implementation lives in `openai_compat`; tests inject
//! scripted stand-ins.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors from the LLM client layer
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Provider is missing configuration (usually an API key)
    #[error("LLM provider not configured: {0}")]
    NotConfigured(String),

    /// The remote API returned an error
    #[error("LLM API error: {0}")]
    Api(String),

    /// The response could not be parsed
    #[error("invalid LLM response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message in a chat exchange (OpenAI-compatible wire shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Set on `Tool` messages to link back to the call being answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Set on `Assistant` messages that requested tool invocations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// A tool result message answering `tool_call_id`
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }
}

/// A tool the generator may invoke during a turn
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object
    pub parameters: serde_json::Value,
}

/// A tool invocation requested by the generator.
///
/// Serializes in the OpenAI wire shape (`{"id", "type", "function": {...}}`)
/// so assistant turns carrying tool calls can be replayed verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "ToolCallWire", from = "ToolCallWire")]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON argument string, exactly as returned by the provider
    pub arguments: String,
}

#[derive(Clone, Serialize, Deserialize)]
struct ToolCallWire {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: ToolCallFunctionWire,
}

#[derive(Clone, Serialize, Deserialize)]
struct ToolCallFunctionWire {
    name: String,
    arguments: String,
}

impl From<ToolCall> for ToolCallWire {
    fn from(call: ToolCall) -> Self {
        Self {
            id: call.id,
            kind: "function".to_string(),
            function: ToolCallFunctionWire {
                name: call.name,
                arguments: call.arguments,
            },
        }
    }
}

impl From<ToolCallWire> for ToolCall {
    fn from(wire: ToolCallWire) -> Self {
        Self {
            id: wire.id,
            name: wire.function.name,
            arguments: wire.function.arguments,
        }
    }
}

/// One assistant turn from a tool-capable generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationTurn {
    /// Final text, if the model produced any this turn
    pub content: Option<String>,
    /// Tool invocations the model wants executed before continuing
    pub tool_calls: Vec<ToolCall>,
}

/// Synchronous-from-the-workflow's-perspective text generation capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a plain text completion for the given messages
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Generate a turn that may request tool invocations instead of text
    async fn generate_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<GenerationTurn>;
}

/// Text embedding capability, used for use-case identity resolution
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Cosine similarity between two embedding vectors.
///
/// Returns -1.0 for mismatched or zero-length vectors so degenerate inputs
/// never win a nearest-neighbour comparison.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return -1.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return -1.0;
    }
    dot / (norm_a * norm_b)
}
