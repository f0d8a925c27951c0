//! Reciprocal rank fusion over dense and sparse candidates
//!
//! Issues both queries against the vector index, scores every candidate
//! by `Σ 1/(C + rank)` across the lists it appears in, and returns the
//! top `k` with deterministic ordering (score descending, id ascending).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::RetrievalConfig;
use crate::error::RagError;
use crate::retrieval::{ChunkPayload, EvidenceSource, ScoredPoint, VectorIndex};

/// One fused candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedHit {
    /// Chunk identifier.
    pub id: String,
    /// Fused RRF score (higher is more relevant).
    pub score: f32,
    /// Chunk payload with the snippet truncated for display.
    pub payload: ChunkPayload,
    /// Always [`EvidenceSource::Vector`].
    pub source: EvidenceSource,
}

/// Ordered, deduplicated fusion output. At most `k` hits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionResult {
    pub hits: Vec<FusedHit>,
}

impl FusionResult {
    /// Number of fused hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True when fusion produced no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Hybrid retriever fusing dense and sparse rankings with RRF.
pub struct FusionRetriever {
    index: Arc<dyn VectorIndex>,
    config: RetrievalConfig,
}

impl FusionRetriever {
    /// Create a fusion retriever over the given index.
    pub fn new(index: Arc<dyn VectorIndex>, config: RetrievalConfig) -> Self {
        Self { index, config }
    }

    /// Run a fused search returning at most `k` hits.
    ///
    /// Both candidate lists are fetched at `prefetch_factor · k` so items
    /// ranked deep in one method can still surface after fusion. Index
    /// failures propagate as [`RagError::Retrieval`].
    pub fn search(&self, query: &str, k: usize) -> Result<FusionResult, RagError> {
        if k == 0 {
            return Err(RagError::Retrieval(anyhow::anyhow!(
                "fusion search requires k >= 1"
            )));
        }

        let fetch = self.config.prefetch_factor * k;
        let dense = self
            .index
            .query_dense(query, fetch)
            .map_err(RagError::Retrieval)?;
        let sparse = self
            .index
            .query_sparse(query, fetch)
            .map_err(RagError::Retrieval)?;

        tracing::debug!(
            "Fusion candidates: {} dense, {} sparse",
            dense.len(),
            sparse.len()
        );

        let mut hits = self.fuse(&[dense, sparse]);
        hits.truncate(k);

        for hit in &mut hits {
            truncate_snippet(&mut hit.payload.text, self.config.snippet_chars);
        }

        Ok(FusionResult { hits })
    }

    /// Apply reciprocal rank fusion across the given ranked lists.
    ///
    /// Rank is the 1-based position within each list; items absent from a
    /// list contribute nothing for it. Ties are broken by id so repeated
    /// invocations order identically.
    fn fuse(&self, lists: &[Vec<ScoredPoint>]) -> Vec<FusedHit> {
        let mut scores: HashMap<String, (f32, ChunkPayload)> = HashMap::new();

        for list in lists {
            for (position, point) in list.iter().enumerate() {
                let rrf = 1.0 / (self.config.rrf_k + (position + 1) as f32);
                scores
                    .entry(point.id.clone())
                    .and_modify(|(score, _)| *score += rrf)
                    .or_insert((rrf, point.payload.clone()));
            }
        }

        let mut fused: Vec<FusedHit> = scores
            .into_iter()
            .map(|(id, (score, payload))| FusedHit {
                id,
                score,
                payload,
                source: EvidenceSource::Vector,
            })
            .collect();

        fused.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        fused
    }
}

/// Truncate text to a character budget on a char boundary.
fn truncate_snippet(text: &mut String, max_chars: usize) {
    if let Some((byte_idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_idx);
        text.push_str("...");
    }
}
