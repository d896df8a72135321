//! Keyed query cache with stale times and prefix invalidation
//!
//! Entries are type-erased so one cache can hold every resource. A key is
//! a sequence of segments (`["diets", 7]`, `["animals", {search: "Bur"}]`)
//! and invalidating a key marks every entry it prefixes as stale.
//! Invalidated entries stay readable until they are refetched.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::models::Id;

/// One component of a [`QueryKey`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySegment {
    Name(String),
    Id(Id),
    /// Request parameters, as sent on the wire
    Params(Vec<(String, String)>),
}

/// Hierarchical cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    pub fn new(name: &str) -> Self {
        Self(vec![KeySegment::Name(name.to_string())])
    }

    pub fn name(mut self, name: &str) -> Self {
        self.0.push(KeySegment::Name(name.to_string()));
        self
    }

    pub fn id(mut self, id: Id) -> Self {
        self.0.push(KeySegment::Id(id));
        self
    }

    pub fn params(mut self, params: Vec<(String, String)>) -> Self {
        self.0.push(KeySegment::Params(params));
        self
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Whether `prefix` matches the leading segments of this key
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match segment {
                KeySegment::Name(name) => write!(f, "{name:?}")?,
                KeySegment::Id(id) => write!(f, "{id}")?,
                KeySegment::Params(params) => {
                    write!(f, "{{")?;
                    for (j, (k, v)) in params.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{k}: {v:?}")?;
                    }
                    write!(f, "}}")?;
                }
            }
        }
        write!(f, "]")
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    updated_at: Instant,
    invalidated: bool,
}

impl Entry {
    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.invalidated && self.updated_at.elapsed() < stale_time
    }
}

/// Shared query cache
#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache").finish_non_exhaustive()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value regardless of freshness
    pub async fn get<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
    }

    /// Cached value if it is younger than `stale_time` and not invalidated
    pub async fn get_fresh<T>(&self, key: &QueryKey, stale_time: Duration) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(stale_time))
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
    }

    /// Store a value, replacing any previous entry under the same key
    pub async fn set<T>(&self, key: QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            Entry {
                value: Arc::new(value),
                updated_at: Instant::now(),
                invalidated: false,
            },
        );
    }

    /// Mark every entry under `prefix` as stale; returns how many matched
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write().await;
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }
        debug!("Invalidated {} cache entries under {}", count, prefix);
        count
    }

    /// Mark only the entry stored under exactly `key` as stale
    pub async fn invalidate_exact(&self, key: &QueryKey) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) => {
                entry.invalidated = true;
                true
            }
            None => false,
        }
    }

    /// Drop every entry
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        debug!("Query cache cleared");
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Serve a fresh cached value or run `fetcher` and cache its result
    ///
    /// Errors are returned without touching the cached entry.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        stale_time: Duration,
        fetcher: F,
    ) -> crate::Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = crate::Result<T>>,
    {
        if let Some(value) = self.get_fresh::<T>(&key, stale_time).await {
            debug!("Cache hit {}", key);
            return Ok(value);
        }
        debug!("Cache miss {}", key);
        let value = fetcher().await?;
        self.set(key, value.clone()).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn diets() -> QueryKey {
        QueryKey::new("diets")
    }

    #[test]
    fn prefix_matching() {
        let detail = diets().id(7);
        let ingredients = diets().id(7).name("ingredients");
        let listing = diets().params(vec![("animal_id".to_string(), "3".to_string())]);

        assert!(detail.starts_with(&diets()));
        assert!(ingredients.starts_with(&detail));
        assert!(listing.starts_with(&diets()));
        assert!(!listing.starts_with(&detail));
        assert!(!QueryKey::new("dietsx").starts_with(&diets()));
        assert!(!diets().starts_with(&detail));
    }

    #[test]
    fn display_reads_like_a_key_array() {
        let key = QueryKey::new("animals").params(vec![("search".to_string(), "Bur".to_string())]);
        assert_eq!(key.to_string(), r#"["animals", {search: "Bur"}]"#);
        assert_eq!(QueryKey::new("diets").id(7).to_string(), r#"["diets", 7]"#);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_entries_are_served_without_fetching() {
        let cache = QueryCache::new();
        let calls = AtomicUsize::new(0);
        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1u64, 2, 3])
        };

        let first = cache.fetch(diets(), Duration::from_secs(60), fetch).await.unwrap();
        let second = cache.fetch(diets(), Duration::from_secs(60), fetch).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.fetch(diets(), Duration::from_secs(60), fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_stale_time_always_refetches() {
        let cache = QueryCache::new();
        cache.set(diets().id(1), "cached".to_string()).await;
        assert!(cache
            .get_fresh::<String>(&diets().id(1), Duration::ZERO)
            .await
            .is_none());
        assert_eq!(
            cache.get::<String>(&diets().id(1)).await.as_deref(),
            Some("cached")
        );
    }

    #[tokio::test]
    async fn invalidate_marks_whole_family_stale_but_keeps_data() {
        let cache = QueryCache::new();
        let hour = Duration::from_secs(3600);
        cache.set(diets().params(Vec::new()), 1u32).await;
        cache.set(diets().id(7), 2u32).await;
        cache.set(QueryKey::new("animals"), 3u32).await;

        assert_eq!(cache.invalidate(&diets()).await, 2);

        assert!(cache.get_fresh::<u32>(&diets().id(7), hour).await.is_none());
        assert_eq!(cache.get::<u32>(&diets().id(7)).await, Some(2));
        assert_eq!(
            cache.get_fresh::<u32>(&QueryKey::new("animals"), hour).await,
            Some(3)
        );
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn invalidate_exact_leaves_children() {
        let cache = QueryCache::new();
        let hour = Duration::from_secs(3600);
        cache.set(diets(), 1u32).await;
        cache.set(diets().id(7), 2u32).await;

        assert!(cache.invalidate_exact(&diets()).await);
        assert!(!cache.invalidate_exact(&diets().id(8)).await);
        assert!(cache.get_fresh::<u32>(&diets(), hour).await.is_none());
        assert_eq!(cache.get_fresh::<u32>(&diets().id(7), hour).await, Some(2));
    }

    #[tokio::test]
    async fn set_after_invalidate_is_fresh_again() {
        let cache = QueryCache::new();
        let hour = Duration::from_secs(3600);
        cache.set(diets().id(7), 1u32).await;
        cache.invalidate(&diets()).await;
        cache.set(diets().id(7), 2u32).await;
        assert_eq!(cache.get_fresh::<u32>(&diets().id(7), hour).await, Some(2));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_value() {
        let cache = QueryCache::new();
        cache.set(diets(), 1u32).await;
        cache.invalidate(&diets()).await;

        let result = cache
            .fetch(diets(), Duration::from_secs(60), || async {
                Err::<u32, _>(crate::BarfikError::NotFound)
            })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.get::<u32>(&diets()).await, Some(1));
    }

    #[tokio::test]
    async fn type_mismatch_reads_as_missing() {
        let cache = QueryCache::new();
        cache.set(diets(), 1u32).await;
        assert!(cache.get::<String>(&diets()).await.is_none());
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = QueryCache::new();
        cache.set(diets(), 1u32).await;
        cache.set(QueryKey::new("animals"), 2u32).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
