//! CLI command handlers

pub mod ask;
pub mod index;
pub mod research;
pub mod status;

use crate::app::SourceArgs;
use anyhow::Result;
use sleuth_core::{load_dir, load_file, Config, Document, ResearchAssistant};

/// Printed when every source came back empty or failed
pub const NOTHING_GATHERED: &str = "No content could be gathered from the given sources.";

/// Apply chunking flags on top of the loaded config
pub fn apply_chunking(config: &mut Config, sources: &SourceArgs) {
    if let Some(size) = sources.chunk_size {
        config.retrieval.chunk_size = size;
    }
    if let Some(overlap) = sources.chunk_overlap {
        config.retrieval.chunk_overlap = overlap;
    }
}

/// Scrape every URL and load every file named on the command line
pub async fn gather_documents(
    assistant: &ResearchAssistant,
    sources: &SourceArgs,
) -> Result<Vec<Document>> {
    for url in &sources.urls {
        eprintln!("Scraping: {}", url);
    }
    let mut documents = assistant.ingest_urls(&sources.urls).await;

    for path in &sources.files {
        documents.push(load_file(path)?);
    }

    if let Some(dir) = &sources.dir {
        let loaded = load_dir(dir, &sources.pattern)?;
        tracing::debug!("Loaded {} files from {}", loaded.len(), dir.display());
        documents.extend(loaded);
    }

    Ok(documents)
}

/// Split, embed and index documents with the configured chunking
pub async fn build_store(
    assistant: &mut ResearchAssistant,
    documents: &[Document],
) -> Result<usize> {
    let retrieval = assistant.config().retrieval.clone();
    eprintln!("Creating vectorstore from {} documents...", documents.len());
    let chunks = assistant
        .create_vectorstore(documents, retrieval.chunk_size, retrieval.chunk_overlap)
        .await?;
    Ok(chunks)
}

pub fn print_metrics(assistant: &ResearchAssistant) {
    if let Some(m) = assistant.metrics() {
        eprintln!(
            "API: {} requests, {} errors, {:.0}% cache hits, {:.0}ms avg latency",
            m.total_requests, m.total_errors, m.cache_hit_rate, m.avg_latency_ms
        );
    }
}
