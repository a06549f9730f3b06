//! Session-scoped memoization of aggregated results.
//!
//! Keyed by the canonical query. There is no TTL and no partial eviction:
//! results represent a live catalog snapshot, and `reset()` is the only
//! invalidation primitive. Population is first-caller-wins per key, so two
//! concurrent searches for the same query produce one network dispatch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::types::AggregatedResult;

pub struct SessionCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<AggregatedResult>>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached result for the key, if a search for it has completed.
    pub async fn get(&self, key: &str) -> Option<AggregatedResult> {
        let entries = self.entries.lock().await;
        entries.get(key).and_then(|cell| cell.get()).cloned()
    }

    /// Store a result. If a result for this key already exists, the existing
    /// one wins and this write is dropped.
    pub async fn put(&self, key: &str, result: AggregatedResult) {
        let cell = self.entry(key).await;
        let _ = cell.set(result);
    }

    /// Fetch-or-populate with per-key mutual exclusion: the first caller for
    /// a key runs `search`, concurrent callers for the same key await that
    /// result, and later callers get the memoized copy verbatim.
    pub async fn get_or_search<F, Fut>(&self, key: &str, search: F) -> AggregatedResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AggregatedResult>,
    {
        let cell = self.entry(key).await;
        cell.get_or_init(search).await.clone()
    }

    /// Drop every memoized result. Equivalent to a page reload.
    pub async fn reset(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of completed, memoized results.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.get().is_some()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn entry(&self, key: &str) -> Arc<OnceCell<AggregatedResult>> {
        let mut entries = self.entries.lock().await;
        Arc::clone(
            entries
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PartQuery;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn result_for(key: &str) -> AggregatedResult {
        AggregatedResult {
            query: PartQuery::new(key, "").canonical(),
            outcomes: Vec::new(),
            fetched_at: Utc::now(),
            duration_ms: None,
        }
    }

    #[tokio::test]
    async fn test_get_put_reset() {
        let cache = SessionCache::new();
        assert!(cache.get("a").await.is_none());

        cache.put("a", result_for("a")).await;
        assert!(cache.get("a").await.is_some());
        assert_eq!(cache.len().await, 1);

        cache.reset().await;
        assert!(cache.get("a").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_first_write_wins() {
        let cache = SessionCache::new();
        cache.put("a", result_for("first")).await;
        cache.put("a", result_for("second")).await;
        let cached = cache.get("a").await.unwrap();
        assert_eq!(cached.query.value, "first");
    }

    #[tokio::test]
    async fn test_concurrent_get_or_search_runs_once() {
        let cache = Arc::new(SessionCache::new());
        let searches = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let searches = Arc::clone(&searches);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_search("100k|0402|", || async {
                        searches.fetch_add(1, Ordering::SeqCst);
                        // Let the other callers pile up on the same cell.
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        result_for("100k")
                    })
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(searches.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_get_or_search_hits_cache_after_first_call() {
        let cache = SessionCache::new();
        let searches = AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_search("k", || async {
                    searches.fetch_add(1, Ordering::SeqCst);
                    result_for("k")
                })
                .await;
        }
        assert_eq!(searches.load(Ordering::SeqCst), 1);
    }
}
