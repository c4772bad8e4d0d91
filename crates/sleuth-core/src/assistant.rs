//! Research assistant facade
//!
//! Ties scraping, splitting, the vector store and the QA chain together
//! behind one stateful object: gather documents, build (or load) a store,
//! then ask questions against it.

use crate::analysis::{analyze_text, ResearchReport};
use crate::chain::{QaAnswer, RetrievalQa};
use crate::config::Config;
use crate::error::{Result, SleuthError};
use crate::llm::{Embedder, HttpEmbedder, LLMClient, MetricsSnapshot, OpenAIClient};
use crate::loader::Document;
use crate::scrape::WebScraper;
use crate::splitter::RecursiveCharacterSplitter;
use crate::store::VectorStore;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;

/// Pages fetched at once by [`ResearchAssistant::ingest_urls`]
const MAX_CONCURRENT_SCRAPES: usize = 4;

pub struct ResearchAssistant {
    config: Config,
    client: Arc<dyn LLMClient>,
    openai: Option<Arc<OpenAIClient>>,
    embedder: Arc<dyn Embedder>,
    scraper: WebScraper,
    chain: RetrievalQa,
    store: Option<VectorStore>,
}

impl ResearchAssistant {
    /// Create an assistant backed by the configured OpenAI-compatible service
    ///
    /// Fails with [`SleuthError::MissingApiKey`] when no API key is configured.
    pub fn new(config: Config) -> Result<Self> {
        config.require_api_key()?;
        let openai = Arc::new(OpenAIClient::new(config.llm_service.clone())?);
        let mut assistant = Self::with_client(config, openai.clone())?;
        assistant.openai = Some(openai);
        Ok(assistant)
    }

    /// Create an assistant around any LLM client
    pub fn with_client(config: Config, client: Arc<dyn LLMClient>) -> Result<Self> {
        let retrieval = &config.retrieval;
        let embedder: Arc<dyn Embedder> = Arc::new(
            HttpEmbedder::new(client.clone())
                .with_batching(retrieval.embedding_batch_size, retrieval.max_concurrent_batches),
        );
        let chain = RetrievalQa::new(client.clone(), embedder.clone(), retrieval.top_k);
        let scraper = WebScraper::new(config.scraper.clone())?;

        Ok(Self {
            config,
            client,
            openai: None,
            embedder,
            scraper,
            chain,
            store: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch a page and return its readable text
    pub async fn scrape_url(&self, url: &str) -> Result<String> {
        self.scraper.scrape_url(url).await
    }

    /// Scrape several pages, skipping the ones that fail or have no text
    pub async fn ingest_urls(&self, urls: &[String]) -> Vec<Document> {
        let scraped: Vec<_> = stream::iter(urls)
            .map(|url| async move { (url, self.scraper.scrape_url(url).await) })
            .buffered(MAX_CONCURRENT_SCRAPES)
            .collect()
            .await;

        scraped
            .into_iter()
            .filter_map(|(url, result)| match result {
                Ok(text) if !text.is_empty() => Some(Document::new(text).with_source(url.clone())),
                Ok(_) => {
                    tracing::warn!("No text content found at {}", url);
                    None
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            })
            .collect()
    }

    /// Split documents, embed the chunks and replace the current store
    ///
    /// Returns the number of chunks indexed.
    pub async fn create_vectorstore(
        &mut self,
        documents: &[Document],
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<usize> {
        let splitter = RecursiveCharacterSplitter::new(chunk_size, chunk_overlap)?;
        let chunks = splitter.split_documents(documents);
        let count = chunks.len();

        let store = VectorStore::from_chunks(chunks, self.embedder.as_ref()).await?;
        tracing::info!("Vectorstore created with {} text chunks", count);
        self.store = Some(store);
        Ok(count)
    }

    /// Answer a question from the loaded documents
    pub async fn ask_question(&self, question: &str) -> Result<QaAnswer> {
        let store = self.store.as_ref().ok_or(SleuthError::NoDocuments)?;
        self.chain.run(store, question).await
    }

    /// Save the current store into `path`
    pub fn save_vectorstore(&self, path: &Path) -> Result<()> {
        let store = self.store.as_ref().ok_or(SleuthError::NoVectorStore)?;
        store.save_local(path)?;
        tracing::info!("Vectorstore saved to {}", path.display());
        Ok(())
    }

    /// Replace the current store with one saved at `path`
    pub fn load_vectorstore(&mut self, path: &Path) -> Result<()> {
        let store = VectorStore::load_local(path)?;
        if store.model() != self.embedder.model_name() {
            tracing::warn!(
                "Vectorstore was built with '{}' but queries will be embedded with '{}'",
                store.model(),
                self.embedder.model_name()
            );
        }
        tracing::info!("Vectorstore loaded from {}", path.display());
        self.store = Some(store);
        Ok(())
    }

    pub fn vectorstore(&self) -> Option<&VectorStore> {
        self.store.as_ref()
    }

    /// Paragraph text of the Wikipedia article for `topic`
    pub async fn gather_topic(&self, topic: &str) -> Result<String> {
        let text = self.scraper.gather_topic(topic).await?;
        if text.trim().is_empty() {
            return Err(SleuthError::scrape(
                &self.scraper.topic_url(topic),
                "no paragraph text found",
            ));
        }
        Ok(text)
    }

    /// Summary and analysis of gathered text
    pub async fn analyze(&self, text: &str) -> Result<String> {
        analyze_text(self.client.as_ref(), text).await
    }

    /// Gather and analyze a topic in one step
    pub async fn research_topic(&self, topic: &str) -> Result<ResearchReport> {
        let text = self.gather_topic(topic).await?;
        let analysis = self.analyze(&text).await?;
        Ok(ResearchReport::new(topic, &text, analysis))
    }

    /// API usage so far, when backed by [`OpenAIClient`]
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.openai.as_ref().map(|c| c.metrics())
    }
}
