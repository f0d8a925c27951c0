//! End-to-end question answering
//!
//! Wires the intent router, the multi-source dispatcher, and the answer
//! synthesizer into one `ask` call with per-stage timings.

use std::time::Instant;

use serde::Serialize;

use crate::answer::AnswerSynthesizer;
use crate::dispatch::{Dispatcher, Evidence};
use crate::error::RagError;
use crate::router::{IntentRequest, IntentRouter};

/// Wall-clock seconds spent in each stage.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StageTimings {
    pub classify_sec: f64,
    pub dispatch_sec: f64,
    pub synthesize_sec: f64,
    pub total_sec: f64,
}

/// Everything `ask` produces for one question.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Final synthesized answer.
    pub answer: String,
    /// Classified intents the answer was grounded on.
    pub request: IntentRequest,
    /// Evidence gathered per source.
    pub evidence: Evidence,
    /// Per-stage timings.
    pub timings: StageTimings,
}

/// The assembled question answering pipeline.
pub struct RagPipeline {
    router: IntentRouter,
    dispatcher: Dispatcher,
    synthesizer: AnswerSynthesizer,
}

impl RagPipeline {
    pub fn new(
        router: IntentRouter,
        dispatcher: Dispatcher,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            router,
            dispatcher,
            synthesizer,
        }
    }

    /// The intent router, exposing its routing log.
    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    /// Answer one question: classify, dispatch, synthesize.
    ///
    /// Classification and synthesis failures abort the call; backend
    /// failures during dispatch degrade to partial evidence instead.
    pub fn ask(&self, question: &str) -> Result<AskResponse, RagError> {
        let started = Instant::now();

        let stage = Instant::now();
        let request = self.router.classify(question)?;
        let classify_sec = stage.elapsed().as_secs_f64();
        tracing::info!(
            "Classified {:?}: {} intents in {classify_sec:.2}s",
            question,
            request.intents.len()
        );

        let stage = Instant::now();
        let evidence = self.dispatcher.dispatch(question, &request);
        let dispatch_sec = stage.elapsed().as_secs_f64();
        if evidence.is_empty() {
            tracing::warn!("No evidence gathered for {question:?}");
        }

        let stage = Instant::now();
        let answer = self.synthesizer.synthesize(question, &evidence)?;
        let synthesize_sec = stage.elapsed().as_secs_f64();

        let timings = StageTimings {
            classify_sec,
            dispatch_sec,
            synthesize_sec,
            total_sec: started.elapsed().as_secs_f64(),
        };
        tracing::info!("Answered in {:.2}s", timings.total_sec);

        Ok(AskResponse {
            answer,
            request,
            evidence,
            timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use std::sync::Arc;

    use crate::config::RetrievalConfig;
    use crate::llm::CompletionModel;
    use crate::retrieval::{FusionRetriever, LocalVectorIndex};
    use crate::embedding::HashingEmbedder;
    use crate::data::ChunkRecord;
    use crate::stores::{CsvGraphStore, JsonDocumentStore, Relationship};

    /// Plays the classifier on intent prompts and the assistant otherwise.
    struct TwoRoleModel;

    impl CompletionModel for TwoRoleModel {
        fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
            if prompt.contains("intent extraction assistant") {
                Ok(r#"{"query": "How does Eevee evolve?", "intents": [
                    {"type": "relational", "entity": "Eevee", "attributes": ["evolves_to"], "confidence": 0.9},
                    {"type": "factual", "entity": "Pikachu", "attributes": ["type"], "confidence": 0.8},
                    {"type": "semantic", "entity": null, "attributes": [], "confidence": 0.7}
                ]}"#
                .to_string())
            } else {
                Ok("Eevee evolves into Vaporeon with a Water Stone.".to_string())
            }
        }

        fn model_name(&self) -> &str {
            "two-role"
        }
    }

    fn pipeline() -> RagPipeline {
        let model = Arc::new(TwoRoleModel);

        let records = vec![ChunkRecord {
            chunk_id: "eevee_chunk_1".to_string(),
            document_name: "eevee".to_string(),
            chunk_index: 1,
            section_name: "Evolutions".to_string(),
            text: "Eevee evolves into Vaporeon when exposed to a Water Stone.".to_string(),
        }];
        let index =
            LocalVectorIndex::build(&records, Arc::new(HashingEmbedder::new(64))).unwrap();
        let retriever =
            FusionRetriever::new(Arc::new(index), RetrievalConfig::default());

        let documents = Arc::new(JsonDocumentStore::from_documents(vec![json!({
            "name": "Pikachu",
            "types": ["Electric"],
        })]));
        let graph = Arc::new(CsvGraphStore::from_edges(vec![(
            "Eevee".to_string(),
            Relationship::EvolvesTo,
            "Vaporeon".to_string(),
        )]));

        RagPipeline::new(
            IntentRouter::new(model.clone()),
            Dispatcher::new(retriever, documents, graph, 5),
            AnswerSynthesizer::new(model),
        )
    }

    #[test]
    fn test_ask_end_to_end() {
        let pipeline = pipeline();

        let response = pipeline.ask("How does Eevee evolve?").unwrap();

        assert_eq!(
            response.answer,
            "Eevee evolves into Vaporeon with a Water Stone."
        );
        assert_eq!(response.request.intents.len(), 3);
        assert_eq!(response.evidence.relational.len(), 1);
        assert_eq!(response.evidence.relational[0].targets, vec!["Vaporeon"]);
        assert_eq!(response.evidence.factual.len(), 1);
        assert!(!response.evidence.semantic.is_empty());
        assert!(response.timings.total_sec >= response.timings.classify_sec);
    }

    #[test]
    fn test_ask_appends_routing_log() {
        let pipeline = pipeline();

        pipeline.ask("How does Eevee evolve?").unwrap();
        pipeline.ask("What type is Pikachu?").unwrap();

        assert_eq!(pipeline.router().log().len(), 2);
        assert!(pipeline.router().log().last().unwrap().success);
    }
}
