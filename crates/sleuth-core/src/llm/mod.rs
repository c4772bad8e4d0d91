//! LLM integration
//!
//! Provides traits and implementations for:
//! - Chat completions via OpenAI-compatible services
//! - Embedding generation via the same services

mod cache;
mod client;
mod http_embedder;
mod traits;

pub use client::{
    ChatMessage, GenerationParams, LLMClient, MetricsSnapshot, OpenAIClient,
};
pub use http_embedder::HttpEmbedder;
pub use traits::*;
