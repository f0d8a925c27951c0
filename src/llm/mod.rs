//! Completion endpoint abstraction
//!
//! Trait-based interface for text completion with an OpenAI-compatible
//! HTTP implementation. Any provider satisfying `complete(prompt,
//! temperature) -> text` is substitutable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// Trait for completion endpoints.
pub trait CompletionModel: Send + Sync {
    /// Complete a prompt at the given sampling temperature.
    fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// OpenAI-compatible chat completion client.
///
/// Works with OpenAI's API and any compatible endpoint (e.g. a local
/// Ollama or vLLM server). Each call is bounded by the configured timeout.
pub struct OpenAiClient {
    client: reqwest::blocking::Client,
    config: LlmConfig,
}

impl OpenAiClient {
    /// Create a new client from the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }
}

impl CompletionModel for OpenAiClient {
    fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.endpoint);
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .context("Completion request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Completion API error {status}: {body}");
        }

        let result: ChatResponse = response
            .json()
            .context("Failed to decode completion response")?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("Completion response contained no choices")?;

        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
