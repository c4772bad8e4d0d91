//! "Stuff" retrieval question answering
//!
//! Retrieves the most similar chunks, stuffs all of them into a single
//! system prompt and asks the chat model to answer from that context.

use crate::error::Result;
use crate::llm::{ChatMessage, Embedder, GenerationParams, LLMClient};
use crate::store::{SearchHit, VectorStore};
use serde::Serialize;
use std::sync::Arc;

const SYSTEM_TEMPLATE: &str = "Use the following pieces of context to answer the user's question. \n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n";

/// Answer plus the chunks it was grounded on
#[derive(Debug, Clone, Serialize)]
pub struct QaAnswer {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SearchHit>,
}

/// Retrieval QA chain over a vector store
pub struct RetrievalQa {
    client: Arc<dyn LLMClient>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl RetrievalQa {
    pub fn new(client: Arc<dyn LLMClient>, embedder: Arc<dyn Embedder>, k: usize) -> Self {
        Self {
            client,
            embedder,
            k,
        }
    }

    /// Answer `question` from the chunks of `store`
    pub async fn run(&self, store: &VectorStore, question: &str) -> Result<QaAnswer> {
        let sources = store
            .similarity_search(question, self.embedder.as_ref(), self.k)
            .await?;
        tracing::debug!(
            "Retrieved {} chunks for question: {}",
            sources.len(),
            question
        );

        let messages = build_messages(&sources, question);
        let answer = self
            .client
            .chat_completion(messages, &GenerationParams::deterministic())
            .await?;

        Ok(QaAnswer {
            question: question.to_string(),
            answer: answer.trim().to_string(),
            sources,
        })
    }
}

/// Chat messages for a question over retrieved context
pub fn build_messages(context: &[SearchHit], question: &str) -> Vec<ChatMessage> {
    let context = context
        .iter()
        .map(|hit| hit.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::system(format!("{}{}", SYSTEM_TEMPLATE, context)),
        ChatMessage::user(question),
    ]
}
