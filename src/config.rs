//! Configuration structs
//!
//! Every external collaborator is configured explicitly and passed to
//! constructors; nothing in the library reads the environment. The binary
//! resolves environment variables into these structs in one place.

use std::time::Duration;

/// Configuration for the completion endpoint client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// Chat model identifier.
    pub model: String,
    /// Base URL of an OpenAI-compatible API.
    pub endpoint: String,
    /// Per-call deadline for completion requests.
    pub timeout: Duration,
}

impl LlmConfig {
    /// Create a config for the given API key with default model/endpoint.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the model name.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Override the API endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Tuning knobs for fusion retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Final number of fused results to return.
    pub top_k: usize,
    /// RRF smoothing constant (standard value: 60).
    pub rrf_k: f32,
    /// Candidates fetched per method, as a multiple of `top_k`.
    pub prefetch_factor: usize,
    /// Character budget for display snippets.
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            rrf_k: 60.0,
            prefetch_factor: 5,
            snippet_chars: 300,
        }
    }
}

impl RetrievalConfig {
    /// Set the number of fused results.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the RRF smoothing constant.
    pub fn with_rrf_k(mut self, rrf_k: f32) -> Self {
        self.rrf_k = rrf_k;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_config_defaults() {
        let config = RetrievalConfig::default();

        assert_eq!(config.top_k, 5);
        assert_eq!(config.rrf_k, 60.0);
        assert_eq!(config.prefetch_factor, 5);
    }

    #[test]
    fn test_llm_config_builder() {
        let config = LlmConfig::new("key".to_string())
            .with_model("gpt-4o")
            .with_endpoint("http://localhost:8080/v1");

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.endpoint, "http://localhost:8080/v1");
    }
}
