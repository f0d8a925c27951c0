//! Query and chunk embedding
//!
//! Trait-based embedding interface with a deterministic feature-hashing
//! implementation. No ML model is required: the hashing embedder maps
//! term-frequency counts into a fixed-dimension space with a sign hash,
//! which is enough for the demo corpus and keeps indexing reproducible.

use anyhow::Result;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// An embedding vector.
pub type Embedding = Vec<f32>;

/// Trait for embedding models.
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the model name.
    fn model_name(&self) -> &str;
}

/// L2-normalize an embedding in place. Zero vectors are left untouched.
pub fn normalize_embedding(embedding: &mut [f32]) {
    let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in embedding.iter_mut() {
            *value /= norm;
        }
    }
}

/// Deterministic feature-hashing embedder.
///
/// Tokenizes on whitespace/punctuation, lowercases, and folds each token's
/// count into a hashed position with a hashed sign. Produces unit-norm
/// vectors so cosine distance reduces to a dot product.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a new hashing embedder with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let mut embedding = vec![0.0; self.dimension];

        let tokens = text
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|token| !token.is_empty());

        let mut count = 0usize;
        for token in tokens {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let hashed = hasher.finish();

            let idx = (hashed as usize) % self.dimension;
            let sign = if hashed & (1u64 << 63) == 0 { 1.0 } else { -1.0 };
            embedding[idx] += sign;
            count += 1;
        }

        if count > 0 {
            for value in embedding.iter_mut() {
                *value /= count as f32;
            }
            normalize_embedding(&mut embedding);
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing-tf"
    }
}
