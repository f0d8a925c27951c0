//! Dense retrieval side of the local index
//!
//! Approximate nearest neighbor search over chunk embeddings via hnsw_rs.

use anyhow::Result;
use hnsw_rs::hnsw::Hnsw;
use hnsw_rs::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

use crate::data::ChunkRecord;
use crate::embedding::Embedder;
use crate::retrieval::{ChunkPayload, ScoredPoint};

/// HNSW search widening factor.
const EF_SEARCH: usize = 64;

/// Dense index: HNSW over embeddings of every chunk's text.
pub struct DenseIndex {
    hnsw: Hnsw<'static, f32, DistCosine>,
    /// HNSW point id to chunk id and payload.
    points: HashMap<usize, (String, ChunkPayload)>,
    embedder: Arc<dyn Embedder>,
}

impl DenseIndex {
    /// Build the index by embedding every chunk.
    pub fn build(records: &[ChunkRecord], embedder: Arc<dyn Embedder>) -> Result<Self> {
        if records.is_empty() {
            anyhow::bail!("Cannot build dense index with no chunks");
        }

        tracing::debug!(
            "Building dense index: {} chunks, {} dimensions",
            records.len(),
            embedder.dimension()
        );

        let hnsw: Hnsw<f32, DistCosine> =
            Hnsw::new(16, records.len(), 16, 200, DistCosine);

        let mut points = HashMap::new();
        for (point_id, record) in records.iter().enumerate() {
            let embedding = embedder.embed(&record.text)?;
            hnsw.insert((embedding.as_slice(), point_id));
            points.insert(point_id, (record.chunk_id.clone(), ChunkPayload::from(record)));
        }

        Ok(Self {
            hnsw,
            points,
            embedder,
        })
    }

    /// Query the index, returning up to `limit` candidates ranked by
    /// cosine similarity.
    pub fn query(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>> {
        let embedding = self.embedder.embed(query)?;
        let neighbours = self
            .hnsw
            .search(embedding.as_slice(), limit, EF_SEARCH.max(limit));

        let mut results = Vec::new();
        for neighbour in neighbours {
            if let Some((chunk_id, payload)) = self.points.get(&neighbour.d_id) {
                results.push(ScoredPoint {
                    id: chunk_id.clone(),
                    // hnsw_rs reports cosine distance; flip to similarity.
                    score: 1.0 - neighbour.distance,
                    rank: results.len() + 1,
                    payload: payload.clone(),
                });
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::retrieval::test_records;

    #[test]
    fn test_dense_build_and_query() {
        let records = test_records();
        let embedder = Arc::new(HashingEmbedder::new(128));
        let index = DenseIndex::build(&records, embedder).unwrap();

        let results = index.query("Eevee evolves into Vaporeon", 3).unwrap();

        assert!(!results.is_empty());
        assert!(results.len() <= 3);
        assert_eq!(results[0].id, "eevee_chunk_1");
        // Ranks are 1-based and contiguous.
        for (i, point) in results.iter().enumerate() {
            assert_eq!(point.rank, i + 1);
        }
    }

    #[test]
    fn test_dense_empty_corpus_rejected() {
        let embedder = Arc::new(HashingEmbedder::new(64));
        assert!(DenseIndex::build(&[], embedder).is_err());
    }
}
