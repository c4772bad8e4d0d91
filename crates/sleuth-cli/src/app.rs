//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sleuth")]
#[command(
    author,
    version,
    about = "Research assistant: scrape, index and question web pages and documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a knowledge base and ask questions about it
    Ask(AskArgs),

    /// Build a knowledge base and save it to disk
    Index(IndexArgs),

    /// Summarize and analyze a Wikipedia topic
    Research(ResearchArgs),

    /// Show what a saved knowledge base contains
    Status(StatusArgs),
}

/// Where documents come from
#[derive(Args, Clone, Default)]
pub struct SourceArgs {
    /// Web page to scrape (repeatable)
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Local file to load: text, markdown, HTML or PDF (repeatable)
    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Directory to load files from
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Glob pattern for files under --dir
    #[arg(long, default_value = "**/*")]
    pub pattern: String,

    /// Characters per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters shared by neighbouring chunks
    #[arg(long)]
    pub chunk_overlap: Option<usize>,
}

impl SourceArgs {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.files.is_empty() && self.dir.is_none()
    }
}

#[derive(Args)]
pub struct AskArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Load a saved knowledge base instead of building one
    #[arg(long, conflicts_with_all = ["urls", "files", "dir"])]
    pub index: Option<PathBuf>,

    /// Question to ask (repeatable)
    #[arg(short = 'q', long = "question", value_name = "QUESTION")]
    pub questions: Vec<String>,

    /// Number of chunks given to the model per question
    #[arg(short = 'k', long = "top-k")]
    pub top_k: Option<usize>,

    /// Save the knowledge base to this directory
    #[arg(long, value_name = "DIR")]
    pub save: Option<PathBuf>,

    /// Show the chunks each answer was based on
    #[arg(long = "sources")]
    pub show_sources: bool,
}

#[derive(Args)]
pub struct IndexArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Directory to save the knowledge base into
    #[arg(long, short)]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct ResearchArgs {
    /// Topic to research (prompted for when omitted)
    pub topic: Option<String>,

    /// Directory the analysis report is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Directory of a saved knowledge base
    #[arg(long)]
    pub index: PathBuf,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
