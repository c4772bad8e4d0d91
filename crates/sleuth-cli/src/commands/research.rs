//! Research command

use crate::app::{OutputFormat, ResearchArgs};
use anyhow::{bail, Result};
use sleuth_core::{Config, ResearchAssistant, ResearchReport};
use std::io::{self, BufRead, Write};

pub async fn run(args: ResearchArgs, config: Config, format: OutputFormat) -> Result<()> {
    let topic = match args.topic {
        Some(topic) => topic.trim().to_string(),
        None => prompt_topic()?,
    };
    if topic.is_empty() {
        bail!("No topic provided. Exiting.");
    }

    let assistant = ResearchAssistant::new(config)?;

    eprintln!("Gathering information about: {}", topic);
    let text = match assistant.gather_topic(&topic).await {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{}", e);
            bail!("Failed to gather information. Please check the topic name and try again.");
        }
    };

    eprintln!("\nGathered {} characters of text.", text.chars().count());
    eprintln!("\nAnalyzing information...\n");
    let analysis = assistant.analyze(&text).await?;
    let report = ResearchReport::new(topic, &text, analysis);

    let saved = match report.write_to(&args.output_dir) {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("\nError saving to file: {}", e);
            None
        }
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "topic": report.topic,
                "gathered_chars": report.gathered_chars,
                "analysis": report.analysis,
                "saved_to": saved.as_ref().map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Cli => {
            let rule = "=".repeat(50);
            println!("{}\nANALYSIS RESULTS:\n{}\n{}", rule, rule, report.analysis);
            if let Some(path) = saved {
                println!("\n✓ Results saved to: {}", path.display());
            }
        }
    }
    Ok(())
}

fn prompt_topic() -> Result<String> {
    eprint!("Enter the topic to research (e.g., Artificial_intelligence): ");
    io::stderr().flush().ok();

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
