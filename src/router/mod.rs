//! LLM-powered multi-intent routing
//!
//! Turns a free-text question into a typed list of intents via one
//! completion call, treating the model output as an untrusted payload:
//! strict parse, brace-scan extraction, Python-literal normalization, one
//! repair call, all inside a bounded retry loop. Every classification
//! call appends exactly one entry to the routing log.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::error::RagError;
use crate::llm::CompletionModel;

const INTENT_PROMPT: &str = r#"You are an intent extraction assistant for a Pokémon knowledge system.

Your task is to analyze the user's question (which may be written in English or Spanish)
and extract *all* distinct intents it expresses.

Each intent must specify:
- The **intent type**: one of ["semantic", "factual", "relational"].
- The **main entity** (Pokémon name, type group, or None).
- The **attributes or relation keywords** in English, matching the database schema.
- A **confidence** score between 0 and 1.

Always return the JSON **in English**, regardless of the language of the question.

Definition of intent types:
- "factual": direct questions about static data or properties (type, stats, abilities, category).
- "relational": questions about links or relationships between entities (e.g., evolutions, strengths, weaknesses, comparisons).
- "semantic": conceptual or reasoning questions (why, explain, compare in general terms).

Use the following schema for attributes:
{
  "type": "Pokémon type or element (e.g., 'Fire', 'Water')",
  "evolves_to": "Evolution target Pokémon",
  "evolves_from": "Previous evolution",
  "strong_against": "Types this Pokémon is strong against",
  "weak_against": "Types this Pokémon is weak against",
  "ability": "Pokémon abilities",
  "stat": "Numeric attributes like HP, Attack, Defense, Speed",
  "category": "General classification (e.g., Legendary, Mythical)",
  "relation": "Generic relational property between entities"
}

Return the result strictly following this format:

{
  "query": "...",
  "intents": [
    {
      "type": "factual | relational | semantic",
      "entity": "Eevee",
      "attributes": ["evolves_to"],
      "confidence": 0.9
    }
  ]
}

If the question includes multiple topics (e.g., two Pokémon or multiple relations),
return one intent per distinct topic.
Never include explanations, comments, or text outside the JSON.
User question: "{question}""#;

/// Mutually exclusive classification of one intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    /// Conceptual or reasoning question, answered from the vector index.
    Semantic,
    /// Direct property question, answered from the document store.
    Factual,
    /// Relationship question, answered from the graph store.
    Relational,
}

/// One classified request fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Intent kind (JSON field `type`).
    #[serde(rename = "type")]
    pub kind: IntentKind,
    /// Subject entity, if the question names one.
    #[serde(default)]
    pub entity: Option<String>,
    /// Attribute keywords. Unknown attributes are kept here and skipped
    /// by the backend that consumes the intent.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Model confidence, clamped into [0, 1] during validation.
    #[serde(default)]
    pub confidence: f32,
}

/// Classifier output: the echoed query plus zero or more intents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRequest {
    pub query: String,
    #[serde(default)]
    pub intents: Vec<Intent>,
}

/// Append-only audit record of one classification call.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingLogEntry {
    /// Original question text.
    pub query: String,
    /// Last raw model output, if any call completed.
    pub response_raw: Option<String>,
    /// Parsed intents, absent when parsing failed.
    pub parsed: Option<IntentRequest>,
    /// Whether classification produced a valid result.
    pub success: bool,
    /// UTC time the entry was appended.
    pub timestamp: DateTime<Utc>,
    /// Wall-clock seconds spent in the call.
    pub elapsed_sec: f64,
    /// 1-based attempt count at which the call finished.
    pub attempts: usize,
}

/// In-process routing log. Append is the only mutation; entries are never
/// modified afterwards. The mutex keeps concurrent appends intact.
#[derive(Debug, Default)]
pub struct RoutingLog {
    entries: Mutex<Vec<RoutingLogEntry>>,
}

impl RoutingLog {
    fn append(&self, entry: RoutingLogEntry) {
        self.entries.lock().expect("routing log poisoned").push(entry);
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("routing log poisoned").len()
    }

    /// True when no classification has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone of all entries, oldest first.
    pub fn snapshot(&self) -> Vec<RoutingLogEntry> {
        self.entries.lock().expect("routing log poisoned").clone()
    }

    /// Clone of the most recent entry.
    pub fn last(&self) -> Option<RoutingLogEntry> {
        self.entries
            .lock()
            .expect("routing log poisoned")
            .last()
            .cloned()
    }
}

/// LLM-backed intent classifier with a JSON-repair retry loop.
pub struct IntentRouter {
    model: Arc<dyn CompletionModel>,
    temperature: f32,
    max_retries: usize,
    log: RoutingLog,
}

impl IntentRouter {
    /// Create a router with default temperature (0.0) and retry budget (2).
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self {
            model,
            temperature: 0.0,
            max_retries: 2,
            log: RoutingLog::default(),
        }
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the retry budget. Each attempt may issue one
    /// classification call plus one repair call.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// The append-only routing log.
    pub fn log(&self) -> &RoutingLog {
        &self.log
    }

    /// Classify a question into a typed intent list.
    ///
    /// Issues at most `2 · max_retries` completion calls. Exactly one log
    /// entry is appended whether the call succeeds or fails.
    pub fn classify(&self, question: &str) -> Result<IntentRequest, RagError> {
        let prompt = INTENT_PROMPT.replace("{question}", question);
        let started = Instant::now();

        let mut raw: Option<String> = None;
        let mut parsed: Option<IntentRequest> = None;
        let mut attempts = 0;

        for attempt in 1..=self.max_retries {
            attempts = attempt;

            let text = match self.model.complete(&prompt, self.temperature) {
                Ok(text) => text,
                Err(err) => {
                    self.log_call(question, raw, None, started, attempts);
                    return Err(RagError::Completion(err));
                }
            };
            parsed = parse_intent_json(&text);
            raw = Some(text);
            if parsed.is_some() {
                break;
            }

            // One repair pass: ask for corrected JSON of the bad output.
            let fix_prompt = format!(
                "Return only valid JSON, fixing the following:\n\n{}",
                raw.as_deref().unwrap_or_default()
            );
            let text = match self.model.complete(&fix_prompt, self.temperature) {
                Ok(text) => text,
                Err(err) => {
                    self.log_call(question, raw, None, started, attempts);
                    return Err(RagError::Completion(err));
                }
            };
            parsed = parse_intent_json(&text);
            raw = Some(text);
            if parsed.is_some() {
                break;
            }

            tracing::warn!("Intent JSON unparseable on attempt {attempt}, retrying");
        }

        self.log_call(question, raw.clone(), parsed.clone(), started, attempts);

        parsed.ok_or(RagError::Classification { attempts, raw })
    }

    fn log_call(
        &self,
        question: &str,
        raw: Option<String>,
        parsed: Option<IntentRequest>,
        started: Instant,
        attempts: usize,
    ) {
        self.log.append(RoutingLogEntry {
            query: question.to_string(),
            response_raw: raw,
            success: parsed.is_some(),
            parsed,
            timestamp: Utc::now(),
            elapsed_sec: started.elapsed().as_secs_f64(),
            attempts,
        });
    }
}

/// Parse model output into a validated intent request.
///
/// Tries strict JSON first, then the largest `{...}` substring with
/// Python literals normalized. Unknown intent kinds fail the parse;
/// unknown attributes are kept for the consumer to skip.
fn parse_intent_json(text: &str) -> Option<IntentRequest> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(request) = serde_json::from_str::<IntentRequest>(trimmed) {
        return Some(validate(request));
    }

    let cleaned = extract_braces(trimmed)?;
    let cleaned = cleaned
        .replace("None", "null")
        .replace("True", "true")
        .replace("False", "false");

    serde_json::from_str::<IntentRequest>(&cleaned)
        .ok()
        .map(validate)
}

/// Largest `{...}` substring: first opening brace to last closing brace.
fn extract_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Coerce out-of-range fields rather than rejecting the whole payload.
fn validate(mut request: IntentRequest) -> IntentRequest {
    for intent in &mut request.intents {
        intent.confidence = intent.confidence.clamp(0.0, 1.0);
    }
    request
}
