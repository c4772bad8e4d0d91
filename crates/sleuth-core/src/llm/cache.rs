//! Response caching so repeated chunks and questions skip the API

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const DEFAULT_CAPACITY: usize = 10_000;

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory TTL cache for LLM responses
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Get cached value if present and not expired
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        (Instant::now() < entry.expires_at).then(|| entry.value.clone())
    }

    /// Store a value; expired entries are evicted when the cache is full
    pub fn set(&self, key: String, value: String) {
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        if entries.len() >= self.capacity {
            let now = Instant::now();
            entries.retain(|_, e| now < e.expires_at);
            if entries.len() >= self.capacity {
                tracing::debug!("Response cache full ({} entries), clearing", entries.len());
                entries.clear();
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

fn hashed_key(prefix: &str, model: &str, payload: &str) -> String {
    let mut hasher = DefaultHasher::new();
    model.hash(&mut hasher);
    payload.hash(&mut hasher);
    format!("{}:{}:{:x}", prefix, model, hasher.finish())
}

/// Cache key for an embedding of `text` under `model`
pub fn embedding_cache_key(model: &str, text: &str) -> String {
    hashed_key("embed", model, text)
}

/// Cache key for a chat completion over serialized `messages`
pub fn chat_cache_key(model: &str, messages: &str) -> String {
    hashed_key("chat", model, messages)
}
