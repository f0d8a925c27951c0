//! Structured evidence backends
//!
//! The document store answers factual attribute lookups; the graph store
//! answers relational traversals. Both are trait seams with file-backed
//! local implementations so the pipeline runs without external services.

pub mod document;
pub mod graph;

pub use document::{lookup_factual, DocumentStore, FactualRecord, JsonDocumentStore};
pub use graph::{lookup_relational, CsvGraphStore, GraphStore, RelationRecord, Relationship};
