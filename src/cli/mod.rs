//! Command-line interface
//!
//! Provides CLI commands for chunk, export-graph, classify, search, and ask.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::answer::AnswerSynthesizer;
use crate::config::{LlmConfig, RetrievalConfig};
use crate::data::graph_export::{export_graph, EvolutionEdge, TypeRelationEdge};
use crate::data::{load_chunks, load_text_documents, save_chunks, Chunker, LlmSectionChunker, SectionChunker};
use crate::dispatch::Dispatcher;
use crate::embedding::HashingEmbedder;
use crate::llm::{CompletionModel, OpenAiClient};
use crate::pipeline::RagPipeline;
use crate::retrieval::{FusionRetriever, LocalVectorIndex};
use crate::router::IntentRouter;
use crate::stores::{CsvGraphStore, JsonDocumentStore};

/// Resolve the completion client from the environment.
fn completion_client(model: &str) -> Result<Arc<dyn CompletionModel>> {
    let api_key = std::env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY is not set")?;
    let config = LlmConfig::new(api_key).with_model(model);
    Ok(Arc::new(OpenAiClient::new(config)?))
}

/// Build the fusion retriever over a chunks artifact.
fn build_retriever(chunks: &str, config: RetrievalConfig) -> Result<FusionRetriever> {
    let records = load_chunks(Path::new(chunks))?;
    let index = LocalVectorIndex::build(&records, Arc::new(HashingEmbedder::default()))?;
    Ok(FusionRetriever::new(Arc::new(index), config))
}

/// Execute the chunk command
pub fn chunk(input: String, output: String, llm: bool, model: String) -> Result<()> {
    tracing::info!("Starting chunking");
    tracing::info!("  Input: {}", input);
    tracing::info!("  Output: {}", output);
    tracing::info!("  LLM chunker: {}", llm);

    let input_path = Path::new(&input);
    let documents = if input_path.is_file() {
        vec![crate::data::load_text_document(input_path)?]
    } else if input_path.is_dir() {
        load_text_documents(input_path)?
    } else {
        anyhow::bail!("Input path does not exist: {}", input);
    };
    tracing::info!("Loaded {} documents", documents.len());

    let chunker: Box<dyn Chunker> = if llm {
        Box::new(LlmSectionChunker::new(completion_client(&model)?))
    } else {
        Box::new(SectionChunker)
    };

    let mut records = Vec::new();
    for document in &documents {
        let chunks = chunker.chunk(document)?;
        tracing::info!("  {}: {} chunks", document.name, chunks.len());
        records.extend(chunks);
    }

    save_chunks(&records, Path::new(&output))?;

    println!("\nChunking Summary:");
    println!("  Documents processed: {}", documents.len());
    println!("  Total chunks created: {}", records.len());
    println!("  Output file: {}", output);

    Ok(())
}

fn load_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {path}"))
}

/// Execute the export-graph command
pub fn export_graph_cmd(
    pokemon: String,
    evolutions: Option<String>,
    relations: Option<String>,
    output: String,
) -> Result<()> {
    tracing::info!("Exporting graph CSVs");
    tracing::info!("  Pokemon: {}", pokemon);
    tracing::info!("  Output: {}", output);

    let docs: Vec<serde_json::Value> = load_json(&pokemon)?;
    let evolutions: Vec<EvolutionEdge> = match evolutions {
        Some(path) => load_json(&path)?,
        None => Vec::new(),
    };
    let relations: Vec<TypeRelationEdge> = match relations {
        Some(path) => load_json(&path)?,
        None => Vec::new(),
    };

    export_graph(&docs, &evolutions, &relations, Path::new(&output))?;

    println!("\nGraph export complete:");
    println!("  Pokemon records: {}", docs.len());
    println!("  Evolution edges: {}", evolutions.len());
    println!("  Type relation edges: {}", relations.len());
    println!("  Output directory: {}", output);

    Ok(())
}

/// Execute the classify command
pub fn classify(question: String, model: String) -> Result<()> {
    let router = IntentRouter::new(completion_client(&model)?);

    let request = router.classify(&question)?;

    println!("{}", serde_json::to_string_pretty(&request)?);
    if let Some(entry) = router.log().last() {
        tracing::info!(
            "Classified in {:.2}s ({} attempts)",
            entry.elapsed_sec,
            entry.attempts
        );
    }

    Ok(())
}

/// Execute the search command
pub fn search(chunks: String, query: String, top_k: usize) -> Result<()> {
    tracing::info!("Searching {} for {:?}", chunks, query);

    let config = RetrievalConfig::default().with_top_k(top_k);
    let retriever = build_retriever(&chunks, config)?;

    let result = retriever.search(&query, top_k)?;

    println!("\nResults for: {query}");
    for (i, hit) in result.hits.iter().enumerate() {
        println!(
            "\n{}. [{:.4}] {} / {}",
            i + 1,
            hit.score,
            hit.payload.document_name,
            hit.payload.section_name
        );
        println!("   {}", hit.payload.text);
    }
    if result.is_empty() {
        println!("\nNo results.");
    }

    Ok(())
}

/// Execute the ask command
pub fn ask(
    chunks: String,
    documents: String,
    graph: String,
    question: String,
    top_k: usize,
    model: String,
) -> Result<()> {
    tracing::info!("Assembling pipeline");
    tracing::info!("  Chunks: {}", chunks);
    tracing::info!("  Documents: {}", documents);
    tracing::info!("  Graph: {}", graph);

    let client = completion_client(&model)?;
    let config = RetrievalConfig::default().with_top_k(top_k);
    let retriever = build_retriever(&chunks, config)?;
    let document_store = Arc::new(JsonDocumentStore::load(&documents)?);
    let graph_store = Arc::new(CsvGraphStore::load(&graph)?);

    let pipeline = RagPipeline::new(
        IntentRouter::new(client.clone()),
        Dispatcher::new(retriever, document_store, graph_store, top_k),
        AnswerSynthesizer::new(client),
    );

    let response = pipeline.ask(&question)?;

    println!("\n{}", response.answer);
    println!("\n---");
    println!(
        "Intents: {} | Evidence: {} semantic, {} factual, {} relational",
        response.request.intents.len(),
        response.evidence.semantic.len(),
        response.evidence.factual.len(),
        response.evidence.relational.len()
    );
    println!(
        "Timing: classify {:.2}s, dispatch {:.2}s, synthesize {:.2}s, total {:.2}s",
        response.timings.classify_sec,
        response.timings.dispatch_sec,
        response.timings.synthesize_sec,
        response.timings.total_sec
    );

    Ok(())
}
