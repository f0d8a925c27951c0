use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pokerag::cli;

#[derive(Parser)]
#[command(name = "pokerag")]
#[command(about = "Multi-source Pokémon question answering with intent routing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split text documents into section chunks
    Chunk {
        /// Input directory or file path (.txt documents)
        #[arg(short, long)]
        input: String,

        /// Output JSONL file for chunk records
        #[arg(short, long)]
        output: String,

        /// Use the LLM chunker for unstructured text
        #[arg(long)]
        llm: bool,

        /// Chat model for the LLM chunker
        #[arg(short, long, default_value = "gpt-4o-mini")]
        model: String,
    },

    /// Export graph node and edge CSVs from entity records
    ExportGraph {
        /// JSON array of Pokémon records
        #[arg(short, long)]
        pokemon: String,

        /// JSON array of evolution edges (source, target)
        #[arg(short, long)]
        evolutions: Option<String>,

        /// JSON array of type relation edges (source, relation, target)
        #[arg(short, long)]
        relations: Option<String>,

        /// Output directory for CSV files
        #[arg(short, long)]
        output: String,
    },

    /// Classify a question into typed intents
    Classify {
        /// Question text
        #[arg(short, long)]
        question: String,

        /// Chat model for classification
        #[arg(short, long, default_value = "gpt-4o-mini")]
        model: String,
    },

    /// Run a fused dense+sparse search over a chunks artifact
    Search {
        /// Chunks JSONL file
        #[arg(short, long)]
        chunks: String,

        /// Query text
        #[arg(short, long)]
        query: String,

        /// Number of results to return
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,
    },

    /// Answer a question end to end
    Ask {
        /// Chunks JSONL file
        #[arg(short, long)]
        chunks: String,

        /// Entity documents file (.json array or .jsonl)
        #[arg(short, long)]
        documents: String,

        /// Directory with exported edge CSVs
        #[arg(short, long)]
        graph: String,

        /// Question text
        #[arg(short, long)]
        question: String,

        /// Top-K for semantic retrieval
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,

        /// Chat model for classification and synthesis
        #[arg(short, long, default_value = "gpt-4o-mini")]
        model: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pokerag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chunk {
            input,
            output,
            llm,
            model,
        } => {
            cli::chunk(input, output, llm, model)?;
        }

        Commands::ExportGraph {
            pokemon,
            evolutions,
            relations,
            output,
        } => {
            cli::export_graph_cmd(pokemon, evolutions, relations, output)?;
        }

        Commands::Classify { question, model } => {
            cli::classify(question, model)?;
        }

        Commands::Search {
            chunks,
            query,
            top_k,
        } => {
            cli::search(chunks, query, top_k)?;
        }

        Commands::Ask {
            chunks,
            documents,
            graph,
            question,
            top_k,
            model,
        } => {
            cli::ask(chunks, documents, graph, question, top_k, model)?;
        }
    }

    Ok(())
}
