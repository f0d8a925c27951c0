//! Multi-source dispatch
//!
//! Fans a classified request out to the vector, document, and graph
//! backends and collects the evidence into per-source buckets. Backend
//! failures are isolated: a failing source logs a warning and leaves its
//! bucket as collected so far, never aborting the other sources.

use std::sync::Arc;

use serde::Serialize;

use crate::retrieval::{FusedHit, FusionRetriever};
use crate::router::{IntentKind, IntentRequest};
use crate::stores::{
    lookup_factual, lookup_relational, DocumentStore, FactualRecord, GraphStore, RelationRecord,
};

/// Evidence gathered across all sources for one question.
#[derive(Debug, Default, Serialize)]
pub struct Evidence {
    /// Fused vector-index hits for semantic intents.
    pub semantic: Vec<FusedHit>,
    /// Document-store projections for factual intents.
    pub factual: Vec<FactualRecord>,
    /// Graph traversal results for relational intents.
    pub relational: Vec<RelationRecord>,
}

impl Evidence {
    /// True when no source produced anything.
    pub fn is_empty(&self) -> bool {
        self.semantic.is_empty() && self.factual.is_empty() && self.relational.is_empty()
    }
}

/// Routes intents to their backends and merges the evidence.
pub struct Dispatcher {
    retriever: FusionRetriever,
    documents: Arc<dyn DocumentStore>,
    graph: Arc<dyn GraphStore>,
    top_k: usize,
}

impl Dispatcher {
    pub fn new(
        retriever: FusionRetriever,
        documents: Arc<dyn DocumentStore>,
        graph: Arc<dyn GraphStore>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            documents,
            graph,
            top_k: top_k.max(1),
        }
    }

    /// Gather evidence for every intent in the request.
    ///
    /// Semantic retrieval runs once on the raw question regardless of how
    /// many semantic intents the classifier produced. Factual and
    /// relational lookups run once per intent. Each source degrades
    /// independently on failure.
    pub fn dispatch(&self, question: &str, request: &IntentRequest) -> Evidence {
        let mut evidence = Evidence::default();

        let wants_semantic = request
            .intents
            .iter()
            .any(|intent| intent.kind == IntentKind::Semantic);

        if wants_semantic {
            match self.retriever.search(question, self.top_k) {
                Ok(result) => evidence.semantic = result.hits,
                Err(err) => tracing::warn!("Vector retrieval failed: {err}"),
            }
        }

        for intent in &request.intents {
            match intent.kind {
                IntentKind::Semantic => {}
                IntentKind::Factual => {
                    match lookup_factual(self.documents.as_ref(), intent) {
                        Ok(Some(record)) => evidence.factual.push(record),
                        Ok(None) => {}
                        Err(err) => tracing::warn!(
                            "Document lookup failed for {:?}: {err}",
                            intent.entity
                        ),
                    }
                }
                IntentKind::Relational => {
                    match lookup_relational(self.graph.as_ref(), intent) {
                        Ok(records) => evidence.relational.extend(records),
                        Err(err) => tracing::warn!(
                            "Graph traversal failed for {:?}: {err}",
                            intent.entity
                        ),
                    }
                }
            }
        }

        tracing::debug!(
            "Evidence: {} semantic, {} factual, {} relational",
            evidence.semantic.len(),
            evidence.factual.len(),
            evidence.relational.len()
        );

        evidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    use crate::config::RetrievalConfig;
    use crate::retrieval::{ChunkPayload, ScoredPoint, VectorIndex};
    use crate::router::Intent;
    use crate::stores::{CsvGraphStore, JsonDocumentStore, Relationship};

    struct StubIndex;

    impl VectorIndex for StubIndex {
        fn query_dense(&self, _query: &str, _limit: usize) -> Result<Vec<ScoredPoint>> {
            Ok(vec![ScoredPoint {
                id: "chunk_1".to_string(),
                score: 0.9,
                rank: 1,
                payload: ChunkPayload {
                    document_name: "eevee".to_string(),
                    section_name: "Evolutions".to_string(),
                    text: "Eevee evolves with elemental stones.".to_string(),
                    extra: serde_json::Map::new(),
                },
            }])
        }

        fn query_sparse(&self, _query: &str, _limit: usize) -> Result<Vec<ScoredPoint>> {
            Ok(Vec::new())
        }
    }

    struct FailingGraph;

    impl GraphStore for FailingGraph {
        fn traverse(&self, _start: &str, _relationship: Relationship) -> Result<Vec<String>> {
            anyhow::bail!("graph unreachable")
        }
    }

    fn intent(kind: IntentKind, entity: Option<&str>, attributes: &[&str]) -> Intent {
        Intent {
            kind,
            entity: entity.map(String::from),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            confidence: 0.9,
        }
    }

    fn request(intents: Vec<Intent>) -> IntentRequest {
        IntentRequest {
            query: "q".to_string(),
            intents,
        }
    }

    fn documents() -> Arc<JsonDocumentStore> {
        Arc::new(JsonDocumentStore::from_documents(vec![json!({
            "name": "Pikachu",
            "types": ["Electric"],
        })]))
    }

    fn graph() -> Arc<CsvGraphStore> {
        Arc::new(CsvGraphStore::from_edges(vec![(
            "Eevee".to_string(),
            Relationship::EvolvesTo,
            "Vaporeon".to_string(),
        )]))
    }

    fn dispatcher(graph: Arc<dyn GraphStore>) -> Dispatcher {
        Dispatcher::new(
            FusionRetriever::new(Arc::new(StubIndex), RetrievalConfig::default()),
            documents(),
            graph,
            5,
        )
    }

    #[test]
    fn test_all_three_sources_populated() {
        let dispatcher = dispatcher(graph());
        let request = request(vec![
            intent(IntentKind::Semantic, None, &[]),
            intent(IntentKind::Factual, Some("Pikachu"), &["type"]),
            intent(IntentKind::Relational, Some("Eevee"), &["evolves_to"]),
        ]);

        let evidence = dispatcher.dispatch("How does Eevee evolve?", &request);

        assert_eq!(evidence.semantic.len(), 1);
        assert_eq!(evidence.factual.len(), 1);
        assert_eq!(evidence.factual[0].attributes["type"], json!(["Electric"]));
        assert_eq!(evidence.relational.len(), 1);
        assert_eq!(evidence.relational[0].targets, vec!["Vaporeon"]);
    }

    #[test]
    fn test_graph_failure_leaves_other_sources_intact() {
        let dispatcher = dispatcher(Arc::new(FailingGraph));
        let request = request(vec![
            intent(IntentKind::Semantic, None, &[]),
            intent(IntentKind::Factual, Some("Pikachu"), &["type"]),
            intent(IntentKind::Relational, Some("Eevee"), &["evolves_to"]),
        ]);

        let evidence = dispatcher.dispatch("How does Eevee evolve?", &request);

        assert!(evidence.relational.is_empty());
        assert_eq!(evidence.semantic.len(), 1);
        assert_eq!(evidence.factual.len(), 1);
    }

    #[test]
    fn test_semantic_search_runs_once_for_multiple_intents() {
        // Two semantic intents must not duplicate the hits.
        let dispatcher = dispatcher(graph());
        let request = request(vec![
            intent(IntentKind::Semantic, None, &[]),
            intent(IntentKind::Semantic, Some("Pikachu"), &[]),
        ]);

        let evidence = dispatcher.dispatch("Explain Electric types", &request);
        assert_eq!(evidence.semantic.len(), 1);
    }

    #[test]
    fn test_no_intents_yields_empty_evidence() {
        let dispatcher = dispatcher(graph());
        let evidence = dispatcher.dispatch("anything", &request(vec![]));
        assert!(evidence.is_empty());
    }
}
