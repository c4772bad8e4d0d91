//! Ask command

use super::{apply_chunking, build_store, gather_documents, print_metrics, NOTHING_GATHERED};
use crate::app::{AskArgs, OutputFormat};
use crate::output::format_answers;
use anyhow::Result;
use sleuth_core::{Config, ResearchAssistant};

/// Asked when no --question is given
pub const DEFAULT_QUESTIONS: [&str; 2] = [
    "What is the main topic discussed?",
    "Summarize the key points.",
];

pub async fn run(
    args: AskArgs,
    mut config: Config,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    apply_chunking(&mut config, &args.sources);
    if let Some(k) = args.top_k {
        config.retrieval.top_k = k;
    }

    let mut assistant = ResearchAssistant::new(config)?;

    if let Some(index) = &args.index {
        assistant.load_vectorstore(index)?;
    } else if args.sources.is_empty() {
        println!(
            "No URLs provided. Pass --url, --file or --dir (or --index) to build a knowledge base."
        );
        return Ok(());
    } else {
        let documents = gather_documents(&assistant, &args.sources).await?;
        if documents.is_empty() {
            println!("{}", NOTHING_GATHERED);
            return Ok(());
        }
        build_store(&mut assistant, &documents).await?;
    }

    if let Some(dir) = &args.save {
        assistant.save_vectorstore(dir)?;
        eprintln!("Vectorstore saved to {}", dir.display());
    }

    let questions: Vec<String> = if args.questions.is_empty() {
        DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect()
    } else {
        args.questions
    };

    let mut answers = Vec::with_capacity(questions.len());
    for question in &questions {
        answers.push(assistant.ask_question(question).await?);
    }

    print!("{}", format_answers(&answers, format, args.show_sources));

    if verbose {
        print_metrics(&assistant);
    }
    Ok(())
}
