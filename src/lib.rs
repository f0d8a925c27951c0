//! # PokeRAG
//!
//! Multi-source Pokémon question answering with intent routing.
//!
//! ## Overview
//!
//! PokeRAG answers free-text questions by classifying them into typed
//! intents, gathering evidence from the right backend per intent, and
//! synthesizing one grounded answer:
//!
//! - LLM intent classification with JSON-repair retries
//! - Hybrid dense+sparse retrieval fused with reciprocal rank fusion
//! - Factual lookups against an entity document store
//! - Relational traversals over a knowledge graph
//! - Multi-source answer synthesis
//!
//! ## Architecture
//!
//! The crate is organized into modular components:
//!
//! - `data` - Document loading, chunking, and graph CSV export
//! - `embedding` - Text embedding for dense retrieval
//! - `retrieval` - Dense, sparse, and fused retrieval
//! - `router` - Intent classification and the routing log
//! - `stores` - Document and graph evidence backends
//! - `dispatch` - Multi-source fan-out with failure isolation
//! - `answer` - Grounded answer synthesis
//! - `pipeline` - End-to-end question answering
//! - `cli` - Command-line interface

// Core modules
pub mod answer;
pub mod cli;
pub mod config;
pub mod data;
pub mod dispatch;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod retrieval;
pub mod router;
pub mod stores;

// Re-export the pipeline surface
pub use error::RagError;
pub use pipeline::{AskResponse, RagPipeline, StageTimings};
