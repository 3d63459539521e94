//! Core trait definitions for the model backend and the trivia source.
//!
//! These async traits are implemented by the `triviaeval-providers` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::TriviaBatch;

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that answer trivia prompts.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "ollama").
    fn name(&self) -> &str;

    /// Send one prompt and return the model's raw reply.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;
}

/// Request to generate an answer from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "llama3.2").
    pub model: String,
    /// The full prompt text.
    pub prompt: String,
    /// Structured output format requested from the model ("json").
    #[serde(default)]
    pub format: Option<String>,
}

impl GenerateRequest {
    /// A request asking the model for a JSON-formatted reply.
    pub fn json(model: &str, prompt: String) -> Self {
        Self {
            model: model.to_string(),
            prompt,
            format: Some("json".to_string()),
        }
    }
}

/// Response from an LLM generate request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw reply text, ideally a JSON object with an `answer` field.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Trivia source trait
// ---------------------------------------------------------------------------

/// Trait for remote question banks.
#[async_trait]
pub trait TriviaSource: Send + Sync {
    /// Human-readable source name (e.g. "opentdb").
    fn name(&self) -> &str;

    /// Fetch up to `amount` questions.
    async fn fetch(&self, amount: u32) -> anyhow::Result<TriviaBatch>;
}
