use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use crate::api::Article;

use super::types::StoreError;

/// Key-value persistence for whole article lists.
///
/// Writes replace the entire list under `key`. Reads of a missing key yield
/// an empty list, and so do reads of a value that no longer parses.
pub trait ArticleListStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<Article>, StoreError>> + Send;

    fn put(
        &self,
        key: &str,
        articles: &[Article],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Decode a persisted list, treating malformed data as empty.
pub(crate) fn decode_list(key: &str, raw: &str) -> Vec<Article> {
    match serde_json::from_str(raw) {
        Ok(articles) => articles,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Persisted article list is malformed, treating as empty");
            Vec::new()
        }
    }
}

/// Process-local store, used by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw, possibly malformed, value under `key`.
    pub fn insert_raw(&self, key: &str, raw: impl Into<String>) {
        self.lock().insert(key.to_string(), raw.into());
    }

    /// The raw value under `key`, if any.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.lists.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ArticleListStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<Article>, StoreError> {
        let raw = self.raw(key);
        Ok(raw.map(|raw| decode_list(key, &raw)).unwrap_or_default())
    }

    async fn put(&self, key: &str, articles: &[Article]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(articles)?;
        self.lock().insert(key.to_string(), raw);
        Ok(())
    }
}
