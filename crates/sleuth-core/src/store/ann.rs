//! HNSW approximate nearest neighbor index for vector search

use super::vectors::cosine_similarity;
use super::StoredChunk;
use crate::error::{Result, SleuthError};
use instant_distance::{Builder, HnswMap, Search};
use std::sync::RwLock;

/// Minimum embedding count to justify building an ANN index.
/// Below this threshold, brute-force is fast enough.
pub(crate) const ANN_THRESHOLD: usize = 1000;

/// Wrapper for f32 vectors implementing instant_distance::Point
#[derive(Clone)]
struct EmbeddingPoint {
    values: Vec<f32>,
}

impl instant_distance::Point for EmbeddingPoint {
    fn distance(&self, other: &Self) -> f32 {
        // Cosine distance = 1.0 - cosine_similarity
        1.0 - cosine_similarity(&self.values, &other.values)
    }
}

/// Lazily built HNSW graph mapping points to chunk ids
pub(crate) struct AnnIndex {
    index: RwLock<Option<HnswMap<EmbeddingPoint, usize>>>,
}

impl AnnIndex {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(None),
        }
    }

    pub fn should_build(&self, count: usize) -> bool {
        count >= ANN_THRESHOLD
    }

    /// Drop the graph; the next search rebuilds it
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.index.write() {
            *guard = None;
        }
    }

    pub fn is_built(&self) -> bool {
        self.index.read().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Search for the k nearest chunks, building the graph on first use.
    /// Returns (chunk id, cosine similarity) pairs.
    pub fn search(&self, chunks: &[StoredChunk], query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if !self.is_built() {
            self.build(chunks)?;
        }

        let guard = self
            .index
            .read()
            .map_err(|e| SleuthError::Index(format!("ANN lock poisoned: {}", e)))?;
        let Some(map) = guard.as_ref() else {
            return Ok(Vec::new());
        };

        let query_point = EmbeddingPoint {
            values: query.to_vec(),
        };
        let mut search = Search::default();

        Ok(map
            .search(&query_point, &mut search)
            .take(k)
            .map(|item| (*item.value, 1.0 - item.distance))
            .collect())
    }

    fn build(&self, chunks: &[StoredChunk]) -> Result<()> {
        let (points, ids): (Vec<EmbeddingPoint>, Vec<usize>) = chunks
            .iter()
            .map(|c| {
                (
                    EmbeddingPoint {
                        values: c.embedding.clone(),
                    },
                    c.id,
                )
            })
            .unzip();

        let hnsw_map = Builder::default().build(points, ids);

        *self
            .index
            .write()
            .map_err(|e| SleuthError::Index(format!("ANN lock poisoned: {}", e)))? = Some(hnsw_map);

        tracing::info!("Built ANN index with {} embeddings", chunks.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(count: usize) -> Vec<StoredChunk> {
        (0..count)
            .map(|i| StoredChunk {
                id: i,
                text: format!("chunk {}", i),
                source: None,
                position: i,
                embedding: vec![
                    (i as f32).sin(),
                    (i as f32).cos(),
                    (i as f32 * 0.5).sin(),
                    (i as f32 * 0.5).cos(),
                ],
            })
            .collect()
    }

    #[test]
    fn test_threshold() {
        let ann = AnnIndex::new();
        assert!(!ann.should_build(ANN_THRESHOLD - 1));
        assert!(ann.should_build(ANN_THRESHOLD));
    }

    #[test]
    fn test_build_and_search() {
        let data = chunks(ANN_THRESHOLD + 10);
        let ann = AnnIndex::new();
        assert!(!ann.is_built());

        let results = ann.search(&data, &data[42].embedding, 5).unwrap();
        assert!(ann.is_built());
        assert_eq!(results.len(), 5);
        assert!(results.iter().any(|(id, _)| *id == 42));
        for (_, sim) in &results {
            assert!(*sim >= -1.0 - 1e-5 && *sim <= 1.0 + 1e-5);
        }

        ann.invalidate();
        assert!(!ann.is_built());
    }
}
