//! HTTP-based embedder using an external LLM service

use super::client::embed_in_batches;
use super::{Embedder, LLMClient};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Embedder that uses an OpenAI-compatible HTTP service
///
/// Large inputs are split into batches of `batch_size` and up to
/// `max_concurrent` requests are kept in flight.
pub struct HttpEmbedder {
    client: Arc<dyn LLMClient>,
    batch_size: usize,
    max_concurrent: usize,
}

impl HttpEmbedder {
    /// Create from LLM client
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            batch_size: 64,
            max_concurrent: 4,
        }
    }

    pub fn with_batching(mut self, batch_size: usize, max_concurrent: usize) -> Self {
        self.batch_size = batch_size;
        self.max_concurrent = max_concurrent;
        self
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.len() <= self.batch_size {
            return self.client.embed_batch(texts).await;
        }
        embed_in_batches(
            self.client.as_ref(),
            texts,
            self.batch_size,
            self.max_concurrent,
        )
        .await
    }

    fn dimensions(&self) -> usize {
        self.client.embedding_dimensions()
    }

    fn model_name(&self) -> &str {
        self.client.embedding_model()
    }
}
