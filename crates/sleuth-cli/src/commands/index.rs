//! Index command

use super::{apply_chunking, build_store, gather_documents, NOTHING_GATHERED};
use crate::app::{IndexArgs, OutputFormat};
use anyhow::Result;
use sleuth_core::{Config, ResearchAssistant};

pub async fn run(args: IndexArgs, mut config: Config, format: OutputFormat) -> Result<()> {
    apply_chunking(&mut config, &args.sources);
    let mut assistant = ResearchAssistant::new(config)?;

    let documents = gather_documents(&assistant, &args.sources).await?;
    if documents.is_empty() {
        anyhow::bail!(NOTHING_GATHERED);
    }
    let chunks = build_store(&mut assistant, &documents).await?;
    assistant.save_vectorstore(&args.out)?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "documents": documents.len(),
                "chunks": chunks,
                "path": args.out.display().to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => {
            println!(
                "Indexed {} chunks from {} documents into {}",
                chunks,
                documents.len(),
                args.out.display()
            );
        }
    }
    Ok(())
}
