//! Sleuth Core Library
//!
//! Core functionality for the sleuth research assistant.
//!
//! # Features
//! - Web page and Wikipedia scraping with HTML text extraction
//! - Local file loading (text, HTML, PDF)
//! - Recursive character splitting with overlap
//! - Embeddings and chat completions via OpenAI-compatible HTTP services
//! - Local vector index with brute-force and HNSW search, persisted to SQLite
//! - "Stuff" retrieval question answering and topic analysis reports

pub mod analysis;
pub mod assistant;
pub mod chain;
pub mod config;
pub mod error;
pub mod llm;
pub mod loader;
pub mod scrape;
pub mod splitter;
pub mod store;

pub use analysis::{analyze_text, ResearchReport};
pub use assistant::ResearchAssistant;
pub use chain::{QaAnswer, RetrievalQa};
pub use config::{Config, LLMServiceConfig, RetrievalConfig, ScraperConfig};
pub use error::{Error, Result, SleuthError};
pub use llm::{
    ChatMessage, Embedder, GenerationParams, HttpEmbedder, LLMClient, MetricsSnapshot,
    OpenAIClient,
};
pub use loader::{load_dir, load_file, Document};
pub use scrape::WebScraper;
pub use splitter::{Chunk, RecursiveCharacterSplitter};
pub use store::{SearchHit, StoreStats, StoredChunk, VectorStore};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "sleuth";

/// Environment variable holding the API credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
