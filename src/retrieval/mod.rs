//! Retrieval backends
//!
//! Defines the vector-index seam (independent dense and sparse queries
//! over the same corpus) and a local implementation backed by HNSW and
//! tantivy, built from chunk records at startup.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::ChunkRecord;
use crate::embedding::Embedder;

pub mod dense;
pub mod fusion;
pub mod sparse;

pub use dense::DenseIndex;
pub use fusion::{FusedHit, FusionResult, FusionRetriever};
pub use sparse::SparseIndex;

/// Origin tag carried by every piece of retrieved evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceSource {
    /// Hybrid vector index (dense + sparse fusion).
    Vector,
    /// Document store factual lookup.
    Document,
    /// Graph store traversal.
    Graph,
}

/// Payload attached to an indexed chunk.
///
/// Carries the fields every backend promises (`document_name`,
/// `section_name`, `text`); anything else is passed through opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Name of the source document.
    pub document_name: String,
    /// Section heading within the document.
    pub section_name: String,
    /// Chunk text.
    pub text: String,
    /// Backend-specific fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl From<&ChunkRecord> for ChunkPayload {
    fn from(record: &ChunkRecord) -> Self {
        Self {
            document_name: record.document_name.clone(),
            section_name: record.section_name.clone(),
            text: record.text.clone(),
            extra: serde_json::Map::new(),
        }
    }
}

/// One ranked candidate from a single retrieval method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPoint {
    /// Chunk identifier.
    pub id: String,
    /// Method-native relevance score (higher is better).
    pub score: f32,
    /// 1-based rank within the method's result list.
    pub rank: usize,
    /// Chunk payload.
    pub payload: ChunkPayload,
}

/// Trait for vector indexes supporting independent dense and sparse queries.
pub trait VectorIndex: Send + Sync {
    /// Dense-embedding similarity query, ranked by cosine similarity.
    fn query_dense(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>>;

    /// Sparse lexical-similarity query, ranked by term-frequency weight.
    fn query_sparse(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>>;
}

/// In-process vector index combining HNSW and tantivy over one corpus.
///
/// Stands in for the external hybrid collection so the pipeline runs
/// without a vector-store service.
pub struct LocalVectorIndex {
    dense: DenseIndex,
    sparse: SparseIndex,
}

impl LocalVectorIndex {
    /// Build both sides of the index from the same chunk records.
    pub fn build(records: &[ChunkRecord], embedder: Arc<dyn Embedder>) -> Result<Self> {
        let dense = DenseIndex::build(records, embedder)?;
        let sparse = SparseIndex::build(records)?;

        tracing::info!("Local vector index built: {} chunks", records.len());
        Ok(Self { dense, sparse })
    }
}

impl VectorIndex for LocalVectorIndex {
    fn query_dense(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>> {
        self.dense.query(query, limit)
    }

    fn query_sparse(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>> {
        self.sparse.query(query, limit)
    }
}

#[cfg(test)]
pub(crate) fn test_records() -> Vec<ChunkRecord> {
    vec![
        ChunkRecord {
            chunk_id: "eevee_chunk_1".to_string(),
            document_name: "eevee".to_string(),
            chunk_index: 1,
            section_name: "Evolutions".to_string(),
            text: "Eevee evolves into Vaporeon when exposed to a Water Stone.".to_string(),
        },
        ChunkRecord {
            chunk_id: "pikachu_chunk_1".to_string(),
            document_name: "pikachu".to_string(),
            chunk_index: 1,
            section_name: "Overview".to_string(),
            text: "Pikachu is an Electric type Pokémon known for its speed.".to_string(),
        },
        ChunkRecord {
            chunk_id: "charizard_chunk_1".to_string(),
            document_name: "charizard".to_string(),
            chunk_index: 1,
            section_name: "Overview".to_string(),
            text: "Charizard is a Fire and Flying type that evolves from Charmeleon.".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;

    #[test]
    fn test_local_index_both_methods() {
        let records = test_records();
        let embedder = Arc::new(HashingEmbedder::new(128));
        let index = LocalVectorIndex::build(&records, embedder).unwrap();

        let dense = index.query_dense("How does Eevee evolve?", 3).unwrap();
        let sparse = index.query_sparse("Eevee Water Stone", 3).unwrap();

        assert!(!dense.is_empty());
        assert!(!sparse.is_empty());
        assert_eq!(sparse[0].id, "eevee_chunk_1");
        assert_eq!(sparse[0].rank, 1);
    }

    #[test]
    fn test_payload_from_record() {
        let records = test_records();
        let payload = ChunkPayload::from(&records[0]);

        assert_eq!(payload.document_name, "eevee");
        assert_eq!(payload.section_name, "Evolutions");
        assert!(payload.extra.is_empty());
    }
}
