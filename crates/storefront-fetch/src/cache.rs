//! History cache for page data using moka
//!
//! A client-side transition checks here before touching the network: data
//! recorded for a destination path (e.g. on an earlier visit) is returned
//! as-is and the fetch callback never runs.

use crate::types::LoadContext;
use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use std::time::Duration;

/// Lookup of previously recorded page data by destination path
#[async_trait]
pub trait HistoryCache<T>: Send + Sync {
    /// Get data recorded for `path`, if any
    async fn lookup(&self, path: &str) -> Option<T>;
}

#[async_trait]
impl<T> HistoryCache<T> for HashMap<String, T>
where
    T: Clone + Send + Sync,
{
    async fn lookup(&self, path: &str) -> Option<T> {
        self.get(path).cloned()
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Bounded concurrent page data cache keyed by path
///
/// Entries are evicted by capacity and, optionally, by age.
#[derive(Debug, Clone)]
pub struct PageCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Cache<String, T>,
}

impl<T> PageCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Record data for a path
    #[inline]
    pub async fn insert(&self, path: impl Into<String>, value: T) {
        self.inner.insert(path.into(), value).await;
    }

    /// Record the data of a settled load under its destination
    pub async fn remember(&self, ctx: &LoadContext, value: &T) {
        tracing::debug!(path = %ctx.as_path, "recording page data");
        self.insert(ctx.cache_key(), value.clone()).await;
    }

    /// Get data for a path
    #[inline]
    pub async fn get(&self, path: &str) -> Option<T> {
        self.inner.get(path).await
    }

    /// Invalidate cache entry
    #[inline]
    pub async fn invalidate(&self, path: &str) {
        self.inner.invalidate(path).await;
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Check if cache contains path
    #[inline]
    pub async fn contains(&self, path: &str) -> bool {
        self.inner.get(path).await.is_some()
    }

    /// Apply pending maintenance so counts are up to date
    #[inline]
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }

    /// Get approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl<T> Default for PageCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create cache with default capacity (1,000 pages)
    fn default() -> Self {
        Self::new(1_000)
    }
}

#[async_trait]
impl<T> HistoryCache<T> for PageCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn lookup(&self, path: &str) -> Option<T> {
        let hit = self.get(path).await;
        if hit.is_some() {
            tracing::debug!(path, "history cache hit");
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_lookup() {
        let cache = PageCache::new(100);
        cache.insert("/c/shoes", "shoes page".to_string()).await;

        assert_eq!(cache.lookup("/c/shoes").await.as_deref(), Some("shoes page"));
        assert!(cache.lookup("/c/hats").await.is_none());
    }

    #[tokio::test]
    async fn remember_keys_by_destination() {
        let cache = PageCache::default();
        let ctx = LoadContext::new("/p/1").with_query("size", "m");
        cache.remember(&ctx, &42_u32).await;

        assert!(cache.contains("/p/1").await);
        assert_eq!(cache.get("/p/1").await, Some(42));
    }

    #[tokio::test]
    async fn invalidation() {
        let cache = PageCache::new(100);
        cache.insert("/a", 1_u8).await;
        cache.insert("/b", 2_u8).await;

        cache.invalidate("/a").await;
        assert!(!cache.contains("/a").await);
        assert!(cache.contains("/b").await);

        cache.invalidate_all();
        assert!(!cache.contains("/b").await);
    }

    #[tokio::test]
    async fn stats() {
        let cache = PageCache::new(100);
        for i in 0..5 {
            cache.insert(format!("/p/{i}"), i).await;
        }
        cache.run_pending_tasks().await;

        assert_eq!(cache.stats().entry_count, 5);
    }

    #[tokio::test]
    async fn plain_map_is_a_history_cache() {
        let mut pages = HashMap::new();
        pages.insert("/".to_string(), "home".to_string());

        assert_eq!(pages.lookup("/").await.as_deref(), Some("home"));
        assert!(pages.lookup("/missing").await.is_none());
    }
}
