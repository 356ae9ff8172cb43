use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lexrag_core::config::Config;
use lexrag_rag::answer::strip_local_summary;
use lexrag_rag::{open_retriever, Answerer, RerankStatus};
use lexrag_vector::PersistedIndex;

#[derive(Parser, Debug)]
#[command(name = "lexrag", version, about = "Search and question answering over the built index")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the best matching chunks.
    Search {
        query: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Answer a question from the retrieved chunks.
    Ask {
        question: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print the full answer as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the manifest of the built index.
    Status,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    match cli.command {
        Command::Search { query, top_k } => {
            let top_k = top_k.unwrap_or(settings.retrieval.top_k);
            let retriever = open_retriever(&settings)?;
            let out = retriever.search_with_status(&query, top_k)?;
            println!("🔍 {} results for: \"{}\"", out.contexts.len(), query);
            if let RerankStatus::Failed(reason) = &out.rerank { println!("⚠️  rerank unavailable ({}), coarse order", reason); }
            for (i, c) in out.contexts.iter().enumerate() {
                println!("\n  {}. score={:.4}", i + 1, c.score);
                println!("     {}", c.text);
            }
        }
        Command::Ask { question, top_k, json } => {
            let top_k = top_k.unwrap_or(settings.retrieval.top_k);
            let answerer = Answerer::new(open_retriever(&settings)?, &settings.generation)?;
            let answer = answerer.answer(&question, top_k, &[])?;
            if json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
                return Ok(());
            }
            println!("{}", strip_local_summary(&answer.answer));
            if let Some(hint) = &answer.source_hint { println!("\nSource: {}", hint); }
            println!("\nContexts:");
            for (i, c) in answer.contexts.iter().enumerate() {
                println!("  [{}] ({:.3}) {}", i + 1, c.score, c.text);
            }
        }
        Command::Status => {
            let index_dir = settings.index_dir();
            let opened = PersistedIndex::open(&index_dir)?;
            let m = &opened.manifest;
            println!("Index:     {}", index_dir.display());
            println!("Embedder:  {}", m.embedder_id);
            println!("Chunks:    {} ({}-d, max {} chars)", m.count, m.dim, m.max_chars);
            println!("Built at:  {}", m.built_at);
            println!("ANN index: {}", m.ann_index.as_deref().unwrap_or("none (exact search)"));
        }
    }
    Ok(())
}
