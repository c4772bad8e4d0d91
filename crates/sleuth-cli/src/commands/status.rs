//! Status command

use crate::app::{OutputFormat, StatusArgs};
use anyhow::Result;
use sleuth_core::VectorStore;

pub async fn run(args: StatusArgs, format: OutputFormat) -> Result<()> {
    let stats = VectorStore::load_local(&args.index)?.stats();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Cli => {
            println!("Chunks:          {}", stats.chunk_count);
            println!("Model:           {}", stats.model);
            println!("Dimensions:      {}", stats.dimensions);
            println!("Created:         {}", stats.created_at.to_rfc3339());
            println!();
            println!("Sources:         {}", stats.sources.len());
            for source in &stats.sources {
                println!("  {}", source);
            }
        }
    }
    Ok(())
}
