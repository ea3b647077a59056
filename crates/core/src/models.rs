//! # Blueprint Models
//!
//! Centralized LLM provider configuration. Every supported provider speaks
//! the OpenAI-compatible dialect, so a `ModelConfig` resolves to a single
//! [`OpenAiCompatClient`](crate::llm::OpenAiCompatClient).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::llm::openai_compat::ClientConfig;
use crate::llm::{LlmError, OpenAiCompatClient};

/// Supported LLM providers
///
/// - Groq - `GROQ_API_KEY` (default; fast hosted Llama models)
/// - Ollama - keyless, local endpoint
/// - OpenAI - `OPENAI_API_KEY`
/// - OpenRouter - `OPENROUTER_API_KEY`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Groq,
    Ollama,
    #[serde(rename = "openai")]
    OpenAI,
    OpenRouter,
}

impl LlmProvider {
    /// Get all available providers
    pub fn all() -> Vec<LlmProvider> {
        vec![
            LlmProvider::Groq,
            LlmProvider::Ollama,
            LlmProvider::OpenAI,
            LlmProvider::OpenRouter,
        ]
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "Groq",
            LlmProvider::Ollama => "Ollama",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::OpenRouter => "OpenRouter",
        }
    }

    /// Environment variable holding the API key, if the provider needs one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Groq => Some("GROQ_API_KEY"),
            LlmProvider::Ollama => None,
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
            LlmProvider::OpenRouter => Some("OPENROUTER_API_KEY"),
        }
    }

    /// Default base URL for the provider's OpenAI-compatible endpoint
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
            LlmProvider::Ollama => "http://localhost:11434/v1",
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    /// Default chat model for the provider
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "llama-3.3-70b-versatile",
            LlmProvider::Ollama => "llama3.1:latest",
            LlmProvider::OpenAI => "gpt-4o",
            LlmProvider::OpenRouter => "meta-llama/llama-3.3-70b-instruct",
        }
    }

    /// Default embedding model for the provider
    pub fn default_embedding_model(&self) -> &'static str {
        match self {
            LlmProvider::Groq => "nomic-embed-text",
            LlmProvider::Ollama => "nomic-embed-text",
            LlmProvider::OpenAI => "text-embedding-3-small",
            LlmProvider::OpenRouter => "text-embedding-3-small",
        }
    }
}

/// Configuration for LLM model selection
///
/// Used per workflow step so the classifier can run on a small local model
/// while the designer and critic run on a hosted one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// LLM provider to use
    #[serde(default)]
    pub provider: LlmProvider,
    /// Model name (e.g. "llama-3.3-70b-versatile")
    pub model: String,
    /// Optional base URL override
    pub base_url: Option<String>,
    /// Sampling temperature (evaluation steps want 0.0)
    #[serde(default)]
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            model: LlmProvider::Groq.default_model().to_string(),
            base_url: None,
            temperature: 0.0,
        }
    }
}

impl ModelConfig {
    /// Create a new model config on the default provider (Groq)
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Create config for a specific provider, using its default model
    pub fn with_provider(provider: LlmProvider) -> Self {
        Self {
            model: provider.default_model().to_string(),
            provider,
            base_url: None,
            temperature: 0.0,
        }
    }

    /// Set the model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set base URL (for self-hosted OpenAI-compatible endpoints)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build the HTTP client for this configuration.
    ///
    /// API keys are resolved from the provider's environment variable; a
    /// missing key for a keyed provider is a configuration error.
    pub fn client(&self) -> Result<OpenAiCompatClient, LlmError> {
        let api_key = match self.provider.api_key_env() {
            Some(var) => std::env::var(var)
                .map_err(|_| LlmError::NotConfigured(format!("{} not set", var)))?,
            None => String::new(),
        };

        let base_url = self
            .base_url
            .clone()
            .unwrap_or_else(|| self.provider.default_base_url().to_string());

        OpenAiCompatClient::new(ClientConfig {
            api_key,
            base_url,
            model: self.model.clone(),
            embedding_model: self.provider.default_embedding_model().to_string(),
            temperature: self.temperature,
            timeout: Duration::from_secs(120),
        })
    }
}
