use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use lexrag_core::config::{resolve_with_base, Config};
use lexrag_embed::get_default_embedder;
use lexrag_rag::IndexBuilder;

/// Rebuild the retrieval index from the source records.
#[derive(Parser, Debug)]
#[command(name = "lexrag-indexer", version)]
struct Args {
    /// Directory with `*.jsonl` / `*.json` records (default: `ingest.data_dir`).
    #[arg(long)]
    data_dir: Option<String>,
    /// Output directory (default: `storage.index_dir`).
    #[arg(long)]
    index_dir: Option<String>,
    /// Index at most this many chunks.
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.settings()?;
    if args.limit.is_some() {
        settings.ingest.limit = args.limit;
    }
    let cwd = std::env::current_dir()?;
    let data_dir: PathBuf = args.data_dir.map(|d| resolve_with_base(&cwd, d)).unwrap_or_else(|| settings.data_dir());
    let index_dir: PathBuf = args.index_dir.map(|d| resolve_with_base(&cwd, d)).unwrap_or_else(|| settings.index_dir());

    println!("lexrag indexer\n==============");
    println!("Data directory:  {}", data_dir.display());
    println!("Index directory: {}", index_dir.display());
    if let Some(limit) = settings.ingest.limit { println!("Limiting to {} chunks", limit); }

    let embedder = get_default_embedder(&settings.embedding)?;
    let report = IndexBuilder::new(embedder.as_ref(), &settings).build_from_directory(&data_dir, &index_dir)?;

    println!("\n✅ Index built");
    println!("📊 {} records -> {} chunks ({}-d)", report.records, report.chunks, report.dim);
    if let Some(ann) = &report.ann_index { println!("📊 ANN index: {}", ann); }
    println!("\n💡 To search, use: cargo run --bin lexrag -- search '<query>'");
    Ok(())
}
