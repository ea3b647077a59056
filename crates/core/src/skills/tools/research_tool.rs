//! # Web Research Tool
//!
//! Searches the web (Brave Search API) and condenses the hits with a small
//! summarizer model, so only ~200-300 words of findings flow back into the
//! designer's context.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, TextGenerator};
use crate::skills::prompts;

const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// Web research capability offered to the designer
#[async_trait]
pub trait Researcher: Send + Sync {
    /// Search for `query` and return a condensed findings summary.
    /// `focus` optionally narrows what the summary should emphasize.
    async fn research(&self, query: &str, focus: &str) -> anyhow::Result<String>;
}

/// One web search hit
#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWebResults>,
}

#[derive(Deserialize)]
struct BraveWebResults {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Brave-backed [`Researcher`] with LLM summarization
pub struct WebResearchTool {
    client: reqwest::Client,
    api_key: String,
    summarizer: Arc<dyn TextGenerator>,
    num_results: usize,
}

impl WebResearchTool {
    pub fn new(api_key: impl Into<String>, summarizer: Arc<dyn TextGenerator>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            summarizer,
            num_results: 5,
        }
    }

    async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchHit>> {
        let url = format!(
            "{}?q={}&count={}",
            BRAVE_SEARCH_URL,
            urlencoding::encode(query),
            self.num_results
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await?
            .error_for_status()?;

        let parsed: BraveResponse = response.json().await?;
        Ok(parsed.web.map(|w| w.results).unwrap_or_default())
    }
}

#[async_trait]
impl Researcher for WebResearchTool {
    async fn research(&self, query: &str, focus: &str) -> anyhow::Result<String> {
        debug!(query, "running web research");

        // Search failures degrade to a textual note, matching how tool
        // output flows back into the designer's transcript.
        let hits = match self.search(query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query, error = %e, "web search failed");
                return Ok(format!("Search failed: {}", e));
            }
        };
        if hits.is_empty() {
            return Ok("No search results found.".to_string());
        }

        let results_text = hits
            .iter()
            .map(|h| format!("**{}**\n{}\n{}", h.title, h.url, h.description))
            .collect::<Vec<_>>()
            .join("\n\n");

        let focus_instruction = if focus.is_empty() {
            String::new()
        } else {
            format!("\nFocus specifically on: {}", focus)
        };

        let messages = [
            ChatMessage::system(format!(
                "{}{}",
                prompts::RESEARCH_SUMMARIZER,
                focus_instruction
            )),
            ChatMessage::user(format!(
                "Search query: {}\n\nSearch results:\n{}\n\nProvide a concise summary of key findings:",
                query, results_text
            )),
        ];

        let summary = self.summarizer.generate(&messages).await?;
        Ok(summary)
    }
}
