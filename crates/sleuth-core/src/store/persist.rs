//! SQLite persistence for vector stores
//!
//! A saved store is a directory holding `index.sqlite` with two tables:
//! `store_meta` (key/value) and `chunks` (text, source, embedding BLOB).

use super::ann::AnnIndex;
use super::vectors::{bytes_to_embedding, embedding_to_bytes};
use super::{StoredChunk, VectorStore};
use crate::error::{Result, SleuthError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags};
use std::collections::HashMap;
use std::path::Path;

pub const INDEX_FILE_NAME: &str = "index.sqlite";

const FORMAT_VERSION: &str = "1";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY,
    position INTEGER NOT NULL,
    source TEXT,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL
);
";

impl VectorStore {
    /// Write the store to `dir`, replacing any store already saved there
    pub fn save_local(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(INDEX_FILE_NAME);
        let mut conn = Connection::open(&path)?;

        let tx = conn.transaction()?;
        tx.execute_batch(SCHEMA)?;
        tx.execute("DELETE FROM chunks", [])?;
        tx.execute("DELETE FROM store_meta", [])?;

        {
            let mut meta = tx.prepare("INSERT INTO store_meta (key, value) VALUES (?1, ?2)")?;
            meta.execute(params!["format_version", FORMAT_VERSION])?;
            meta.execute(params!["model", self.model])?;
            meta.execute(params!["dimensions", self.dimensions.to_string()])?;
            meta.execute(params!["created_at", self.created_at.to_rfc3339()])?;

            let mut insert = tx.prepare(
                "INSERT INTO chunks (id, position, source, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for chunk in &self.chunks {
                insert.execute(params![
                    chunk.id as i64,
                    chunk.position as i64,
                    chunk.source,
                    chunk.text,
                    embedding_to_bytes(&chunk.embedding),
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!("Saved {} chunks to {}", self.chunks.len(), path.display());
        Ok(())
    }

    /// Read a store previously written by [`VectorStore::save_local`]
    pub fn load_local(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE_NAME);
        if !path.is_file() {
            return Err(SleuthError::NotFound(format!(
                "no vector store at {}",
                dir.display()
            )));
        }

        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

        let meta: HashMap<String, String> = {
            let mut stmt = conn.prepare("SELECT key, value FROM store_meta")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            let meta = rows.collect::<std::result::Result<HashMap<String, String>, _>>()?;
            meta
        };

        let meta_value = |key: &str| {
            meta.get(key)
                .cloned()
                .ok_or_else(|| SleuthError::Index(format!("store metadata is missing '{}'", key)))
        };

        let version = meta_value("format_version")?;
        if version != FORMAT_VERSION {
            return Err(SleuthError::Index(format!(
                "unsupported store format version {}",
                version
            )));
        }

        let model = meta_value("model")?;
        let dimensions: usize = meta_value("dimensions")?
            .parse()
            .map_err(|e| SleuthError::Index(format!("invalid dimensions: {}", e)))?;
        let created_at = DateTime::parse_from_rfc3339(&meta_value("created_at")?)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| SleuthError::Index(format!("invalid created_at: {}", e)))?;

        let mut stmt =
            conn.prepare("SELECT id, position, source, text, embedding FROM chunks ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            let position: i64 = row.get(1)?;
            let bytes: Vec<u8> = row.get(4)?;
            Ok(StoredChunk {
                id: id as usize,
                position: position as usize,
                source: row.get(2)?,
                text: row.get(3)?,
                embedding: bytes_to_embedding(&bytes),
            })
        })?;

        let mut chunks = Vec::new();
        for (expected_id, row) in rows.enumerate() {
            let mut chunk = row?;
            if chunk.embedding.len() != dimensions {
                return Err(SleuthError::Index(format!(
                    "chunk {} has {} dimensions, store expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    dimensions
                )));
            }
            // Ids double as positions in the chunk list.
            chunk.id = expected_id;
            chunks.push(chunk);
        }

        tracing::info!("Loaded {} chunks from {}", chunks.len(), path.display());
        Ok(Self {
            chunks,
            model,
            dimensions,
            created_at,
            ann: AnnIndex::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{chunk, KeywordEmbedder};
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("kb");

        let store = VectorStore::from_chunks(
            vec![chunk("rust notes", "a.md"), chunk("ocean notes", "b.md")],
            &KeywordEmbedder,
        )
        .await
        .unwrap();
        store.save_local(&dir).unwrap();
        assert!(dir.join(INDEX_FILE_NAME).exists());

        let loaded = VectorStore::load_local(&dir).unwrap();
        assert_eq!(loaded.chunks(), store.chunks());
        assert_eq!(loaded.model(), "keyword-test");
        assert_eq!(loaded.dimensions(), store.dimensions());
        assert_eq!(
            loaded.stats().created_at.timestamp(),
            store.stats().created_at.timestamp()
        );

        let hits = loaded
            .similarity_search("ocean", &KeywordEmbedder, 1)
            .await
            .unwrap();
        assert_eq!(hits[0].source.as_deref(), Some("b.md"));
    }

    #[tokio::test]
    async fn test_save_replaces_previous_store() {
        let temp = TempDir::new().unwrap();

        let big = VectorStore::from_chunks(
            vec![chunk("rust", "a"), chunk("python", "b"), chunk("music", "c")],
            &KeywordEmbedder,
        )
        .await
        .unwrap();
        big.save_local(temp.path()).unwrap();

        let small = VectorStore::from_chunks(vec![chunk("ocean", "d")], &KeywordEmbedder)
            .await
            .unwrap();
        small.save_local(temp.path()).unwrap();

        let loaded = VectorStore::load_local(temp.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.chunks()[0].text, "ocean");
    }

    #[test]
    fn test_load_missing_store() {
        let temp = TempDir::new().unwrap();
        let err = VectorStore::load_local(&temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, SleuthError::NotFound(_)));
        assert!(err.to_string().contains("no vector store"));
    }
}
