//! Sparse retrieval side of the local index
//!
//! BM25 full-text search via an in-RAM tantivy index. The index is
//! rebuilt from chunk records at startup and never modified afterwards.

use anyhow::{Context, Result};
use std::collections::HashMap;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::*;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy};

use crate::data::ChunkRecord;
use crate::retrieval::{ChunkPayload, ScoredPoint};

/// Sparse index: BM25 over every chunk's text.
pub struct SparseIndex {
    index: Index,
    reader: IndexReader,
    content_field: Field,
    chunk_id_field: Field,
    payloads: HashMap<String, ChunkPayload>,
}

impl SparseIndex {
    /// Build an in-RAM BM25 index from chunk records.
    pub fn build(records: &[ChunkRecord]) -> Result<Self> {
        if records.is_empty() {
            anyhow::bail!("Cannot build sparse index with no chunks");
        }

        tracing::debug!("Building sparse index: {} chunks", records.len());

        let mut schema_builder = Schema::builder();
        let chunk_id_field = schema_builder.add_text_field("chunk_id", STRING | STORED);
        let content_field = schema_builder.add_text_field("content", TEXT);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        let mut writer: IndexWriter = index
            .writer(50_000_000)
            .context("Failed to create index writer")?;

        let mut payloads = HashMap::new();
        for record in records {
            writer.add_document(doc!(
                chunk_id_field => record.chunk_id.clone(),
                content_field => record.text.clone(),
            ))?;
            payloads.insert(record.chunk_id.clone(), ChunkPayload::from(record));
        }
        writer.commit()?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        reader.reload()?;

        Ok(Self {
            index,
            reader,
            content_field,
            chunk_id_field,
            payloads,
        })
    }

    /// Query the index, returning up to `limit` candidates ranked by BM25.
    ///
    /// Parsing is lenient: question marks and other operators in free-text
    /// queries are ignored rather than rejected.
    pub fn query(&self, query: &str, limit: usize) -> Result<Vec<ScoredPoint>> {
        let searcher = self.reader.searcher();

        let query_parser = QueryParser::for_index(&self.index, vec![self.content_field]);
        let (parsed, _errors) = query_parser.parse_query_lenient(query);

        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(limit.max(1)))?;

        let mut results = Vec::new();
        for (score, doc_address) in top_docs {
            let retrieved: tantivy::TantivyDocument = searcher.doc(doc_address)?;
            let chunk_id = retrieved
                .get_first(self.chunk_id_field)
                .and_then(|value| value.as_str());

            if let Some(chunk_id) = chunk_id {
                if let Some(payload) = self.payloads.get(chunk_id) {
                    results.push(ScoredPoint {
                        id: chunk_id.to_string(),
                        score,
                        rank: results.len() + 1,
                        payload: payload.clone(),
                    });
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::test_records;

    #[test]
    fn test_sparse_build_and_query() {
        let index = SparseIndex::build(&test_records()).unwrap();

        let results = index.query("Water Stone", 2).unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].id, "eevee_chunk_1");
        assert_eq!(results[0].rank, 1);
    }

    #[test]
    fn test_sparse_lenient_query_parsing() {
        let index = SparseIndex::build(&test_records()).unwrap();

        // Free-text punctuation must not fail the parse.
        let results = index.query("What type is Pikachu?", 3).unwrap();
        assert!(results.iter().any(|point| point.id == "pikachu_chunk_1"));
    }

    #[test]
    fn test_sparse_no_match_is_empty() {
        let index = SparseIndex::build(&test_records()).unwrap();

        let results = index.query("xyzzy", 3).unwrap();
        assert!(results.is_empty());
    }
}
