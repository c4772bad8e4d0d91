//! HTTP client for OpenAI-compatible LLM services

use super::cache::{chat_cache_key, embedding_cache_key, ResponseCache};
use crate::config::LLMServiceConfig;
use crate::error::{Result, SleuthError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Trait for LLM service clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<String>;

    /// Generate embeddings for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn embedding_dimensions(&self) -> usize;

    /// Get chat model name
    fn model_name(&self) -> &str;

    /// Get embedding model name
    fn embedding_model(&self) -> &str;
}

/// Chat message for completion requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling parameters for a single completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl GenerationParams {
    /// Deterministic answers, used for question answering
    pub fn deterministic() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
        }
    }

    /// Looser sampling, used for open-ended analysis
    pub fn creative() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: None,
        }
    }

    fn is_deterministic(&self) -> bool {
        self.temperature == 0.0
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::deterministic()
    }
}

#[derive(Debug, Default)]
struct APIMetrics {
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub avg_latency_ms: f64,
}

/// OpenAI-compatible client
pub struct OpenAIClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    cache: ResponseCache,
    metrics: APIMetrics,
}

impl OpenAIClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            config,
            cache: ResponseCache::new(),
            metrics: APIMetrics::default(),
        })
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate: if lookups > 0 {
                hits as f64 / lookups as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Embed texts in parallel with multiple concurrent batches
    ///
    /// Results come back in input order regardless of completion order.
    pub async fn embed_batch_parallel(
        &self,
        texts: &[String],
        batch_size: usize,
        max_concurrent: usize,
    ) -> Result<Vec<Vec<f32>>> {
        embed_in_batches(self, texts, batch_size, max_concurrent).await
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.http_client.post(url);
        if let Some(api_key) = self.config.api_key() {
            req = req.bearer_auth(api_key);
        }
        req
    }

    fn record_error(&self) {
        self.metrics.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, start: Instant) {
        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);
    }

    async fn check_status(&self, response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        self.record_error();
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(SleuthError::ExternalError(format!(
            "{} error (HTTP {}): {}",
            what, status, body
        )))
    }
}

/// Split `texts` into batches, embed up to `max_concurrent` batches at once
/// and flatten the results back into input order.
pub(crate) async fn embed_in_batches<E>(
    embedder: &E,
    texts: &[String],
    batch_size: usize,
    max_concurrent: usize,
) -> Result<Vec<Vec<f32>>>
where
    E: LLMClient + ?Sized,
{
    const DEFAULT_BATCH_SIZE: usize = 32;
    const DEFAULT_CONCURRENT: usize = 4;

    let chunk_size = if batch_size > 0 {
        batch_size
    } else {
        DEFAULT_BATCH_SIZE
    };
    let concurrent = if max_concurrent > 0 {
        max_concurrent
    } else {
        DEFAULT_CONCURRENT
    };

    // Owned batches keep the per-batch futures free of borrowed slices.
    let chunks: Vec<Vec<String>> = texts.chunks(chunk_size).map(<[String]>::to_vec).collect();
    let total_chunks = chunks.len();

    tracing::info!(
        "Embedding {} texts in {} batches ({} concurrent)",
        texts.len(),
        total_chunks,
        concurrent
    );

    let mut results: Vec<_> = stream::iter(chunks)
        .enumerate()
        .map(|(idx, chunk)| async move {
            tracing::debug!("Processing batch {}/{}", idx + 1, total_chunks);
            (idx, embedder.embed_batch(&chunk).await)
        })
        .buffer_unordered(concurrent)
        .collect()
        .await;

    results.sort_by_key(|(idx, _)| *idx);

    let mut all_embeddings = Vec::with_capacity(texts.len());
    for (_, result) in results {
        all_embeddings.extend(result?);
    }
    Ok(all_embeddings)
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<String> {
        let start = Instant::now();

        // Sampled completions are not reproducible, so only temperature 0 is cached.
        let cache_key = if params.is_deterministic() {
            let messages_json = serde_json::to_string(&messages)?;
            Some(chat_cache_key(&self.config.model, &messages_json))
        } else {
            None
        };

        if let Some(cached) = cache_key.as_deref().and_then(|k| self.cache.get(k)) {
            tracing::debug!("Cache hit for chat completion");
            self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }
        if cache_key.is_some() {
            self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<ChatMessage>,
            temperature: f32,
            #[serde(skip_serializing_if = "Option::is_none")]
            max_tokens: Option<u32>,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<ChatChoice>,
        }

        #[derive(Deserialize)]
        struct ChatChoice {
            message: ChatMessage,
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.config.url.trim_end_matches('/'));
        tracing::debug!("POST {} (model {})", url, self.config.model);

        let response = self.request(&url).json(&request).send().await.map_err(|e| {
            self.record_error();
            SleuthError::Http(e)
        })?;
        let response = self.check_status(response, "LLM service").await?;

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            self.record_error();
            SleuthError::Http(e)
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                self.record_error();
                SleuthError::Llm("No response from LLM".to_string())
            })?
            .message
            .content;

        if let Some(key) = cache_key {
            self.cache.set(key, content.clone());
        }
        self.record_latency(start);

        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| SleuthError::Llm("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let model = &self.config.embedding_model;

        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut uncached_texts = Vec::new();
        let mut uncached_indices = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let cached = self
                .cache
                .get(&embedding_cache_key(model, text))
                .and_then(|json| serde_json::from_str::<Vec<f32>>(&json).ok());
            match cached {
                Some(embedding) => {
                    self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
                    results.push(Some(embedding));
                }
                None => {
                    self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
                    results.push(None);
                    uncached_texts.push(text.clone());
                    uncached_indices.push(i);
                }
            }
        }

        if uncached_texts.is_empty() {
            tracing::debug!("All {} embeddings from cache", texts.len());
            return collect_embeddings(results);
        }

        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            "Embedding batch: {} cached, {} to fetch",
            texts.len() - uncached_texts.len(),
            uncached_texts.len()
        );

        #[derive(Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
        }

        #[derive(Deserialize)]
        struct EmbedResponse {
            data: Vec<EmbedData>,
        }

        #[derive(Deserialize)]
        struct EmbedData {
            #[serde(default)]
            index: Option<usize>,
            embedding: Vec<f32>,
        }

        let request = EmbedRequest {
            model,
            input: &uncached_texts,
        };

        let url = format!(
            "{}/v1/embeddings",
            self.config.embeddings_url().trim_end_matches('/')
        );

        let response = self.request(&url).json(&request).send().await.map_err(|e| {
            self.record_error();
            SleuthError::Http(e)
        })?;
        let response = self.check_status(response, "Embedding service").await?;

        let embed_response: EmbedResponse = response.json().await.map_err(|e| {
            self.record_error();
            SleuthError::Http(e)
        })?;

        if embed_response.data.len() != uncached_texts.len() {
            self.record_error();
            return Err(SleuthError::Llm(format!(
                "Embedding service returned {} vectors for {} inputs",
                embed_response.data.len(),
                uncached_texts.len()
            )));
        }

        for (pos, data) in embed_response.data.into_iter().enumerate() {
            let i = data.index.unwrap_or(pos);
            let Some(&original_idx) = uncached_indices.get(i) else {
                self.record_error();
                return Err(SleuthError::Llm(format!(
                    "Embedding service returned out-of-range index {}",
                    i
                )));
            };

            if let Ok(json) = serde_json::to_string(&data.embedding) {
                self.cache
                    .set(embedding_cache_key(model, &uncached_texts[i]), json);
            }
            results[original_idx] = Some(data.embedding);
        }

        self.record_latency(start);
        collect_embeddings(results)
    }

    fn embedding_dimensions(&self) -> usize {
        self.config.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn embedding_model(&self) -> &str {
        &self.config.embedding_model
    }
}

fn collect_embeddings(results: Vec<Option<Vec<f32>>>) -> Result<Vec<Vec<f32>>> {
    results
        .into_iter()
        .map(|r| r.ok_or_else(|| SleuthError::Llm("Missing embedding in response".to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn mock_config(server: &MockServer) -> LLMServiceConfig {
        LLMServiceConfig {
            url: server.base_url(),
            embedding_url: None,
            model: "chat-test".to_string(),
            embedding_model: "embed-test".to_string(),
            api_key: Some("test-key".to_string()),
            ..LLMServiceConfig::default()
        }
    }

    fn chat_body(content: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[test]
    fn test_chat_message_roles() {
        assert_eq!(ChatMessage::system("a").role, "system");
        assert_eq!(ChatMessage::user("b").role, "user");
        assert_eq!(ChatMessage::assistant("c").role, "assistant");
    }

    #[test]
    fn test_generation_params() {
        assert!(GenerationParams::deterministic().is_deterministic());
        assert!(!GenerationParams::creative().is_deterministic());
        assert_eq!(GenerationParams::creative().temperature, 0.7);
    }

    #[test]
    fn test_metrics_start_empty() {
        let client = OpenAIClient::new(LLMServiceConfig::default()).unwrap();
        let m = client.metrics();
        assert_eq!(m.total_requests, 0);
        assert_eq!(m.cache_hit_rate, 0.0);
        assert_eq!(m.avg_latency_ms, 0.0);
    }

    #[tokio::test]
    async fn test_chat_cached_only_at_zero_temperature() {
        let server = MockServer::start_async().await;
        let deterministic = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .body_contains("\"temperature\":0.0");
                then.status(200).json_body(chat_body("fixed"));
            })
            .await;
        let creative = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .body_contains("\"temperature\":0.7");
                then.status(200).json_body(chat_body("sampled"));
            })
            .await;

        let client = OpenAIClient::new(mock_config(&server)).unwrap();
        let messages = vec![ChatMessage::user("same question")];
        for _ in 0..2 {
            let answer = client
                .chat_completion(messages.clone(), &GenerationParams::deterministic())
                .await
                .unwrap();
            assert_eq!(answer, "fixed");
        }
        for _ in 0..2 {
            client
                .chat_completion(messages.clone(), &GenerationParams::creative())
                .await
                .unwrap();
        }

        assert_eq!(deterministic.hits_async().await, 1);
        assert_eq!(creative.hits_async().await, 2);

        let m = client.metrics();
        assert_eq!(m.total_requests, 3);
        assert_eq!(m.cache_hits, 1);
        assert_eq!(m.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_embeddings_reordered_by_index() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200).json_body(json!({
                    "data": [
                        { "index": 1, "embedding": [0.0, 1.0] },
                        { "index": 0, "embedding": [1.0, 0.0] }
                    ]
                }));
            })
            .await;

        let client = OpenAIClient::new(mock_config(&server)).unwrap();
        let embeddings = client
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

        // Both vectors are cached under the text they belong to.
        assert_eq!(client.embed("second").await.unwrap(), vec![0.0, 1.0]);
        assert_eq!(client.metrics().total_requests, 1);
    }

    #[tokio::test]
    async fn test_embed_batch_parallel_keeps_input_order() {
        let server = MockServer::start_async().await;
        let batches = [
            (r#"["alpha","beta"]"#, vec![[1.0], [2.0]]),
            (r#"["gamma","delta"]"#, vec![[3.0], [4.0]]),
            (r#"["epsilon"]"#, vec![[5.0]]),
        ];
        for (input, vectors) in &batches {
            let data: Vec<_> = vectors
                .iter()
                .enumerate()
                .map(|(index, v)| json!({ "index": index, "embedding": v }))
                .collect();
            server
                .mock_async(|when, then| {
                    when.method(POST)
                        .path("/v1/embeddings")
                        .body_contains(format!("\"input\":{}", input));
                    then.status(200).json_body(json!({ "data": data }));
                })
                .await;
        }

        let client = OpenAIClient::new(mock_config(&server)).unwrap();
        let texts: Vec<String> = ["alpha", "beta", "gamma", "delta", "epsilon"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let embeddings = client.embed_batch_parallel(&texts, 2, 3).await.unwrap();

        assert_eq!(
            embeddings,
            vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![5.0]]
        );
        assert_eq!(client.metrics().total_requests, 3);
    }
}
