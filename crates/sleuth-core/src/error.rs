//! Error types for sleuth

use thiserror::Error;

/// Result type alias using SleuthError
pub type Result<T> = std::result::Result<T, SleuthError>;

/// Error type alias for convenience
pub type Error = SleuthError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for sleuth
#[derive(Debug, Error)]
pub enum SleuthError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("OpenAI API key must be provided or set in OPENAI_API_KEY environment variable")]
    MissingApiKey,

    #[error("No documents loaded. Please create a vectorstore first.")]
    NoDocuments,

    #[error("No vectorstore to save")]
    NoVectorStore,

    #[error("Error scraping {url}: {reason}")]
    Scrape { url: String, reason: String },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl SleuthError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoDocuments | Self::NoVectorStore | Self::NotFound(_) => {
                exit_codes::NOT_FOUND
            }
            Self::MissingApiKey | Self::Config(_) | Self::InvalidInput(_) => {
                exit_codes::INVALID_INPUT
            }
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    pub(crate) fn scrape(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Scrape {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
