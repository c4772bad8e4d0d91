//! Local vector index over embedded chunks
//!
//! Chunks live in memory alongside their embeddings. Small stores are
//! searched by brute force; once a store grows past the ANN threshold an
//! HNSW graph is built on first search and reused until the store changes.
//! Stores persist to a single SQLite file inside a directory.

mod ann;
mod persist;
mod vectors;

pub use persist::INDEX_FILE_NAME;
pub use vectors::{bytes_to_embedding, cosine_similarity, embedding_to_bytes};

use crate::error::{Result, SleuthError};
use crate::llm::Embedder;
use crate::splitter::Chunk;
use ann::AnnIndex;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// Chunk text together with its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub id: usize,
    pub text: String,
    pub source: Option<String>,
    pub position: usize,
    pub embedding: Vec<f32>,
}

/// One retrieved chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: usize,
    pub text: String,
    pub source: Option<String>,
    pub score: f32,
}

/// Summary of a store's contents
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub chunk_count: usize,
    pub sources: Vec<String>,
    pub model: String,
    pub dimensions: usize,
    pub created_at: DateTime<Utc>,
}

/// In-memory vector store
pub struct VectorStore {
    chunks: Vec<StoredChunk>,
    model: String,
    dimensions: usize,
    created_at: DateTime<Utc>,
    ann: AnnIndex,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("chunks", &self.chunks.len())
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("created_at", &self.created_at)
            .field("ann_built", &self.ann.is_built())
            .finish()
    }
}

impl VectorStore {
    /// Empty store for embeddings produced by `model`
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            chunks: Vec::new(),
            model: model.into(),
            dimensions,
            created_at: Utc::now(),
            ann: AnnIndex::new(),
        }
    }

    /// Embed `chunks` and build a store from them
    pub async fn from_chunks(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        if chunks.is_empty() {
            return Err(SleuthError::NoDocuments);
        }
        let mut store = Self::new(embedder.model_name(), embedder.dimensions());
        store.add_chunks(chunks, embedder).await?;
        Ok(store)
    }

    /// Embed and append chunks
    ///
    /// The first batch added to an empty store fixes its dimensions to the
    /// length the embedding service actually returns.
    pub async fn add_chunks(&mut self, chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(SleuthError::Index(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        if self.chunks.is_empty() {
            if let Some(first) = embeddings.first() {
                if first.len() != self.dimensions {
                    tracing::debug!(
                        "Embedding dimensions {} differ from configured {}, using returned size",
                        first.len(),
                        self.dimensions
                    );
                    self.dimensions = first.len();
                }
            }
        }

        let mut stored = Vec::with_capacity(chunks.len());
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            if embedding.len() != self.dimensions {
                return Err(SleuthError::Index(format!(
                    "embedding has {} dimensions, store expects {}",
                    embedding.len(),
                    self.dimensions
                )));
            }
            stored.push(StoredChunk {
                id: self.chunks.len() + stored.len(),
                text: chunk.text,
                source: chunk.source,
                position: chunk.position,
                embedding,
            });
        }

        let added = stored.len();
        self.chunks.extend(stored);
        self.ann.invalidate();
        tracing::debug!("Added {} chunks ({} total)", added, self.chunks.len());
        Ok(added)
    }

    /// Top-`k` chunks most similar to `query`, best first
    pub async fn similarity_search(
        &self,
        query: &str,
        embedder: &dyn Embedder,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }
        let query_embedding = embedder.embed(query).await?;
        self.search_by_vector(&query_embedding, k)
    }

    /// Top-`k` chunks most similar to an already embedded query
    pub fn search_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(SleuthError::Index(format!(
                "query embedding has {} dimensions, store expects {}",
                query.len(),
                self.dimensions
            )));
        }

        let k = k.min(self.chunks.len());
        let mut ranked = if self.ann.should_build(self.chunks.len()) {
            self.ann.search(&self.chunks, query, k)?
        } else {
            Vec::new()
        };

        if ranked.len() < k {
            ranked = brute_force(&self.chunks, query, k);
        }

        Ok(ranked
            .into_iter()
            .filter_map(|(id, score)| {
                self.chunks.get(id).map(|c| SearchHit {
                    id,
                    text: c.text.clone(),
                    source: c.source.clone(),
                    score,
                })
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[StoredChunk] {
        &self.chunks
    }

    /// Embedding model the stored vectors came from
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn stats(&self) -> StoreStats {
        let sources: BTreeSet<String> = self
            .chunks
            .iter()
            .filter_map(|c| c.source.clone())
            .collect();
        StoreStats {
            chunk_count: self.chunks.len(),
            sources: sources.into_iter().collect(),
            model: self.model.clone(),
            dimensions: self.dimensions,
            created_at: self.created_at,
        }
    }
}

fn brute_force(chunks: &[StoredChunk], query: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut similarities: Vec<(usize, f32)> = chunks
        .iter()
        .map(|c| (c.id, cosine_similarity(query, &c.embedding)))
        .collect();
    similarities.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    similarities.truncate(k);
    similarities
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic embedder: counts of a few marker words
    pub(crate) struct KeywordEmbedder;

    pub(crate) const KEYWORDS: [&str; 4] = ["rust", "python", "ocean", "music"];

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(KEYWORDS
                .iter()
                .map(|k| lower.matches(k).count() as f32 + 0.01)
                .collect())
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            KEYWORDS.len()
        }

        fn model_name(&self) -> &str {
            "keyword-test"
        }
    }

    pub(crate) fn chunk(text: &str, source: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source: Some(source.to_string()),
            position: 0,
        }
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let chunks = vec![
            chunk("Rust ownership and rust lifetimes", "a"),
            chunk("Python decorators", "b"),
            chunk("The ocean is deep", "c"),
        ];
        let store = VectorStore::from_chunks(chunks, &KeywordEmbedder).await.unwrap();

        let hits = store
            .similarity_search("tell me about rust", &KeywordEmbedder, 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source.as_deref(), Some("a"));
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_search_k_larger_than_store() {
        let store = VectorStore::from_chunks(vec![chunk("music", "m")], &KeywordEmbedder)
            .await
            .unwrap();
        let hits = store
            .similarity_search("music", &KeywordEmbedder, 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let none = store
            .similarity_search("music", &KeywordEmbedder, 0)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_from_empty_chunks_fails() {
        let result = VectorStore::from_chunks(Vec::new(), &KeywordEmbedder).await;
        assert!(matches!(result, Err(SleuthError::NoDocuments)));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let mut store = VectorStore::new("m", 2);
        store.chunks.push(StoredChunk {
            id: 0,
            text: "x".into(),
            source: None,
            position: 0,
            embedding: vec![1.0, 0.0],
        });
        assert!(matches!(
            store.search_by_vector(&[1.0, 0.0, 0.0], 1),
            Err(SleuthError::Index(_))
        ));
    }

    #[tokio::test]
    async fn test_dimensions_follow_returned_embeddings() {
        let mut store = VectorStore::new("keyword-test", 1536);
        store
            .add_chunks(vec![chunk("rust", "a")], &KeywordEmbedder)
            .await
            .unwrap();
        assert_eq!(store.dimensions(), KEYWORDS.len());
    }

    #[tokio::test]
    async fn test_stats_dedupes_sources() {
        let chunks = vec![
            chunk("rust one", "https://b.example"),
            chunk("rust two", "https://a.example"),
            chunk("rust three", "https://a.example"),
        ];
        let store = VectorStore::from_chunks(chunks, &KeywordEmbedder).await.unwrap();
        let stats = store.stats();
        assert_eq!(stats.chunk_count, 3);
        assert_eq!(stats.sources, vec!["https://a.example", "https://b.example"]);
        assert_eq!(stats.model, "keyword-test");
    }

    fn wave_store(count: usize) -> VectorStore {
        let mut store = VectorStore::new("wave", 4);
        store.chunks = (0..count)
            .map(|i| {
                let x = i as f32;
                StoredChunk {
                    id: i,
                    text: format!("chunk {}", i),
                    source: None,
                    position: i,
                    embedding: vec![x.sin(), x.cos(), (x * 0.5).sin(), (x * 0.5).cos()],
                }
            })
            .collect();
        store
    }

    #[test]
    fn test_small_store_searches_without_ann() {
        let store = wave_store(ann::ANN_THRESHOLD - 1);
        let query = store.chunks[7].embedding.clone();
        let hits = store.search_by_vector(&query, 3).unwrap();
        assert_eq!(hits[0].id, 7);
        assert!(!store.ann.is_built());
    }

    #[test]
    fn test_large_store_searches_with_ann() {
        let store = wave_store(ann::ANN_THRESHOLD + 50);
        let query = store.chunks[42].embedding.clone();
        let hits = store.search_by_vector(&query, 5).unwrap();

        assert!(store.ann.is_built());
        assert_eq!(hits.len(), 5);
        assert!(hits.iter().any(|h| h.id == 42 && h.text == "chunk 42"));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score - 1e-6));
    }
}
