//! # OpenAI-Compatible Client
//!
//! Single HTTP client for every provider speaking the OpenAI chat-completions
//! and embeddings dialect (Groq, Ollama, OpenAI, OpenRouter). Providers differ
//! only in base URL and API key.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::{
    ChatMessage, Embedder, GenerationTurn, LlmError, Result, TextGenerator, ToolCall,
    ToolDefinition,
};

/// Configuration for an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct ClientConfig {
    /// API key; empty string for keyless endpoints (local Ollama)
    pub api_key: String,
    /// Base URL up to and including the version segment, e.g.
    /// `https://api.groq.com/openai/v1`
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// Embedding model name, used by `Embedder::embed`
    pub embedding_model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
}

// Custom Debug to keep the API key out of logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Mask an API key for safe display
fn mask_api_key(key: &str) -> String {
    if key.len() <= 8 {
        return "****".to_string();
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}

/// Strip key material and noise out of upstream error text
fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
    {
        return "API authentication error. Check the provider API key.".to_string();
    }
    if lower.contains("rate limit") || lower.contains("quota") {
        return "Provider rate limit exceeded. Please wait and retry.".to_string();
    }
    if error.len() < 200 && !lower.contains("key") {
        return error.to_string();
    }
    "An API error occurred. Please try again.".to_string()
}

/// HTTP client for OpenAI-compatible chat-completions and embeddings
pub struct OpenAiCompatClient {
    client: Client,
    config: ClientConfig,
}

// Wire types (request)

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
}

#[derive(Serialize)]
struct WireTool<'a> {
    r#type: &'static str,
    function: &'a ToolDefinition,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

// Wire types (response)

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    // `ToolCall` deserializes from the provider's wire shape directly
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiCompatClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Api(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn post_chat(&self, request: &ChatRequest<'_>) -> Result<ChatResponseMessage> {
        debug!(model = %request.model, "sending chat completion request");

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Content-Type", "application/json");
        if !self.config.api_key.is_empty() {
            builder = builder.header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            );
        }

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Api(sanitize_api_error(&e.to_string())))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(sanitize_api_error(&error_text)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            tools: None,
        };
        let message = self.post_chat(&request).await?;
        Ok(message.content.unwrap_or_default())
    }

    async fn generate_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<GenerationTurn> {
        let wire_tools: Vec<WireTool<'_>> = tools
            .iter()
            .map(|t| WireTool {
                r#type: "function",
                function: t,
            })
            .collect();

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            tools: Some(wire_tools),
        };
        let message = self.post_chat(&request).await?;

        Ok(GenerationTurn {
            content: message.content.filter(|c| !c.is_empty()),
            tool_calls: message.tool_calls.unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiCompatClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: text,
        };

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .header("Content-Type", "application/json");
        if !self.config.api_key.is_empty() {
            builder = builder.header(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            );
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Api(sanitize_api_error(&e.to_string())))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(sanitize_api_error(&error_text)));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::InvalidResponse("no embedding in response".to_string()))
    }
}
