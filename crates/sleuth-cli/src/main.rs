//! Sleuth CLI
//!
//! Scrape pages and files into a local knowledge base and ask questions about it.

use anyhow::Result;
use clap::Parser;
use sleuth_core::{Config, SleuthError};
use std::process::ExitCode;

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // Variables already set in the environment take precedence over .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let sleuth_error = e.downcast_ref::<SleuthError>();
            if matches!(sleuth_error, Some(SleuthError::MissingApiKey)) {
                eprintln!("\nPlease set your OpenAI API key:");
                eprintln!("export OPENAI_API_KEY='your-api-key-here'");
            }
            let code = sleuth_error.map(SleuthError::exit_code).unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let mut filter =
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());
    for target in ["sleuth", "sleuth_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Ask(args) => commands::ask::run(args, config, cli.format, cli.verbose).await,
        Commands::Index(args) => commands::index::run(args, config, cli.format).await,
        Commands::Research(args) => commands::research::run(args, config, cli.format).await,
        Commands::Status(args) => commands::status::run(args, cli.format).await,
    }
}
