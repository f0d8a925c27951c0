//! Answer synthesis
//!
//! Builds one grounded prompt from the per-source evidence buckets and
//! asks the completion model for the final answer. Each bucket renders
//! at most three snippets of at most 300 characters; an empty bucket
//! renders a fixed placeholder so the model knows the source was dry.

use std::sync::Arc;

use serde::Serialize;

use crate::dispatch::Evidence;
use crate::error::RagError;
use crate::llm::CompletionModel;

/// Snippets rendered per evidence bucket.
const SNIPPETS_PER_SOURCE: usize = 3;

/// Character budget per snippet.
const SNIPPET_CHARS: usize = 300;

/// Placeholder for a bucket that produced nothing.
const NO_DATA: &str = "No data available.";

/// Sampling temperature for synthesis.
const SYNTHESIS_TEMPERATURE: f32 = 0.4;

/// Composes the grounded prompt and produces the final answer.
pub struct AnswerSynthesizer {
    model: Arc<dyn CompletionModel>,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Synthesize an answer from the question and gathered evidence.
    pub fn synthesize(&self, question: &str, evidence: &Evidence) -> Result<String, RagError> {
        let prompt = build_prompt(question, evidence);
        tracing::debug!("Synthesis prompt: {} chars", prompt.len());

        let answer = self
            .model
            .complete(&prompt, SYNTHESIS_TEMPERATURE)
            .map_err(RagError::Synthesis)?;

        Ok(answer.trim().to_string())
    }
}

/// Render the grounded prompt with one section per evidence source.
fn build_prompt(question: &str, evidence: &Evidence) -> String {
    format!(
        "You are a knowledgeable Pokémon assistant.\n\
         \n\
         User question: {question}\n\
         \n\
         Semantic context (vector index):\n\
         {semantic}\n\
         \n\
         Factual context (document store):\n\
         {factual}\n\
         \n\
         Relational context (knowledge graph):\n\
         {relational}\n\
         \n\
         Respond clearly and in a friendly explanatory tone.\n\
         If some parts of the answer are uncertain, say so briefly.",
        semantic = join_snippets(evidence.semantic.iter().map(|hit| hit.payload.text.clone())),
        factual = join_snippets(evidence.factual.iter().map(render_json)),
        relational = join_snippets(evidence.relational.iter().map(render_json)),
    )
}

fn render_json<T: Serialize>(record: T) -> String {
    serde_json::to_string(&record).unwrap_or_else(|_| "{}".to_string())
}

/// Bullet-join up to three snippets, each truncated to the character
/// budget. Empty input renders the placeholder.
fn join_snippets(items: impl Iterator<Item = String>) -> String {
    let lines: Vec<String> = items
        .take(SNIPPETS_PER_SOURCE)
        .map(|item| format!("- {}", truncate_chars(&item, SNIPPET_CHARS)))
        .collect();

    if lines.is_empty() {
        NO_DATA.to_string()
    } else {
        lines.join("\n")
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
