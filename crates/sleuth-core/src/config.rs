//! Configuration management

use crate::error::{Result, SleuthError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Chunking and retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Web scraping settings
    #[serde(default)]
    pub scraper: ScraperConfig,
}

/// LLM service configuration for OpenAI-compatible endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the service for chat/completions
    #[serde(default = "default_llm_url")]
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// API key, normally taken from OPENAI_API_KEY
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }

    /// API key if one is configured and non-empty
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_chat_model(),
            embedding_url: std::env::var("SLEUTH_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            api_key: std::env::var(crate::API_KEY_ENV).ok(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_llm_url() -> String {
    std::env::var("SLEUTH_LLM_URL").unwrap_or_else(|_| "https://api.openai.com".to_string())
}

fn default_chat_model() -> String {
    std::env::var("SLEUTH_LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("SLEUTH_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "text-embedding-ada-002".to_string())
}

fn default_embedding_dimensions() -> usize {
    std::env::var("SLEUTH_EMBEDDING_DIMS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1536)
}

fn default_timeout() -> u64 {
    60
}

/// Chunking and retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of chunks stuffed into the QA prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_batch_size")]
    pub embedding_batch_size: usize,

    #[serde(default = "default_concurrent")]
    pub max_concurrent_batches: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            embedding_batch_size: default_batch_size(),
            max_concurrent_batches: default_concurrent(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    4
}

fn default_batch_size() -> usize {
    64
}

fn default_concurrent() -> usize {
    4
}

/// Web scraping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_scrape_timeout")]
    pub timeout_secs: u64,

    /// Base URL that topic names are appended to
    #[serde(default = "default_wikipedia_url")]
    pub wikipedia_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_scrape_timeout(),
            wikipedia_url: default_wikipedia_url(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_scrape_timeout() -> u64 {
    10
}

fn default_wikipedia_url() -> String {
    std::env::var("SLEUTH_WIKIPEDIA_URL")
        .unwrap_or_else(|_| "https://en.wikipedia.org/wiki".to_string())
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

impl Config {
    /// Load config from SLEUTH_CONFIG or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("SLEUTH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from a specific path; a missing file yields defaults
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_yaml(&content)?
        } else {
            Config::default()
        };

        // The environment credential always wins over the file.
        if let Ok(key) = std::env::var(crate::API_KEY_ENV) {
            config.llm_service.api_key = Some(key);
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Return the API key or fail with `MissingApiKey`
    pub fn require_api_key(&self) -> Result<&str> {
        self.llm_service.api_key().ok_or(SleuthError::MissingApiKey)
    }

    fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.chunk_size == 0 {
            return Err(SleuthError::Config("chunk_size must be positive".into()));
        }
        if r.chunk_overlap > r.chunk_size {
            return Err(SleuthError::Config(format!(
                "chunk_overlap ({}) is larger than chunk_size ({})",
                r.chunk_overlap, r.chunk_size
            )));
        }
        if r.top_k == 0 {
            return Err(SleuthError::Config("top_k must be positive".into()));
        }
        Ok(())
    }
}
