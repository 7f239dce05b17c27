use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::store::KvStore;
use crate::upstream::UpstreamError;

const KEY_PREFIX: &str = "cinemood";

/// Time source for expiry decisions. Injected so tests can advance a
/// manual clock instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cache key namespace, one per logical operation. Enables per-category
/// TTLs and bulk invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Recommendations,
    Search,
    Details,
    Genres,
    Availability,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Recommendations => "recommendations",
            Category::Search => "search",
            Category::Details => "details",
            Category::Genres => "genres",
            Category::Availability => "availability",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown cache category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "recommendations" => Ok(Category::Recommendations),
            "search" => Ok(Category::Search),
            "details" => Ok(Category::Details),
            "genres" => Ok(Category::Genres),
            "availability" => Ok(Category::Availability),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Per-category freshness policy. Discovery results go stale quickly,
/// movie details and the genre list are near-static.
#[derive(Debug, Clone)]
pub struct TtlConfig {
    pub recommendations: Duration,
    pub search: Duration,
    pub details: Duration,
    pub genres: Duration,
    pub availability: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            recommendations: Duration::minutes(5),
            search: Duration::minutes(5),
            details: Duration::hours(24),
            genres: Duration::hours(24),
            availability: Duration::hours(24),
        }
    }
}

impl TtlConfig {
    fn for_category(&self, category: Category) -> Duration {
        match category {
            Category::Recommendations => self.recommendations,
            Category::Search => self.search,
            Category::Details => self.details,
            Category::Genres => self.genres,
            Category::Availability => self.availability,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    value: Value,
    stored_at: DateTime<Utc>,
}

/// TTL response cache over a [`KvStore`].
///
/// Caching is an optimization, never a correctness boundary: any read
/// or write failure degrades to a miss and the caller falls through to
/// the upstream service.
pub struct ResponseCache {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    ttl: TtlConfig,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KvStore>, ttl: TtlConfig) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KvStore>, ttl: TtlConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Derive the cache key for a request. Parameter objects are
    /// rendered as canonical JSON (object keys sorted recursively), so
    /// logically identical requests always map to the same key.
    pub fn make_key<P: Serialize>(&self, category: Category, params: &P) -> String {
        let canonical = serde_json::to_value(params)
            .map(|v| canonical_json(&v))
            .unwrap_or_else(|_| "null".to_string());
        format!("{}_{}_{}", KEY_PREFIX, category.as_str(), canonical)
    }

    /// Cached value for the request, or None if absent, expired, or
    /// unreadable. Stale entries are left in place and overwritten by
    /// the next write.
    pub async fn read<T, P>(&self, category: Category, params: &P) -> Option<T>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let key = self.make_key(category, params);
        self.read_key(category, &key).await
    }

    pub async fn write<T, P>(&self, category: Category, params: &P, value: &T)
    where
        T: Serialize,
        P: Serialize,
    {
        let key = self.make_key(category, params);
        self.write_key(&key, value).await;
    }

    /// Remove all entries under `category`, or every cache entry when
    /// no category is given.
    pub async fn invalidate(&self, category: Option<Category>) {
        let prefix = match category {
            Some(c) => format!("{}_{}_", KEY_PREFIX, c.as_str()),
            None => format!("{}_", KEY_PREFIX),
        };
        for key in self.store.keys(&prefix).await {
            self.store.remove(&key).await;
        }
    }

    /// Read-through fetch. Concurrent misses for the same key are
    /// collapsed onto a single upstream call; waiters pick the result
    /// up from the cache. Upstream errors are returned uncached.
    pub async fn get_or_fetch<T, P, F, Fut>(
        &self,
        category: Category,
        params: &P,
        fetch: F,
    ) -> Result<T, UpstreamError>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let key = self.make_key(category, params);

        if let Some(hit) = self.read_key(category, &key).await {
            return Ok(hit);
        }

        let gate = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let guard = gate.lock().await;

        // A task that held the gate before us may have populated the
        // cache while we waited.
        if let Some(hit) = self.read_key(category, &key).await {
            drop(guard);
            self.release_gate(&key, &gate).await;
            return Ok(hit);
        }

        let result = fetch().await;
        if let Ok(ref value) = result {
            self.write_key(&key, value).await;
        }

        drop(guard);
        self.release_gate(&key, &gate).await;
        result
    }

    async fn release_gate(&self, key: &str, gate: &Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        if let Some(entry) = inflight.get(key) {
            // Only drop the map slot once no other task holds it.
            if Arc::ptr_eq(entry, gate) && Arc::strong_count(entry) <= 2 {
                inflight.remove(key);
            }
        }
    }

    async fn read_key<T: DeserializeOwned>(&self, category: Category, key: &str) -> Option<T> {
        let raw = self.store.get(key).await?;
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache entry");
                return None;
            }
        };

        let age = self.clock.now() - entry.stored_at;
        if age >= self.ttl.for_category(category) {
            debug!(key, "cache entry expired");
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "cached value has unexpected shape");
                None
            }
        }
    }

    async fn write_key<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize value for cache");
                return;
            }
        };
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => self.store.set(key, &raw).await,
            Err(e) => warn!(key, error = %e, "failed to serialize cache entry"),
        }
    }
}

/// Render a JSON value with object keys sorted recursively. Plain
/// `to_string` would make the key depend on map iteration order.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let inner: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", inner.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::cache::store::MemoryStore;

    struct ManualClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: StdMutex::new(Utc::now()),
            }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    /// KvStore whose writes always fail, as if the backend were out of
    /// space. Failures must stay invisible to cache callers.
    struct FailingStore;

    #[async_trait::async_trait]
    impl KvStore for FailingStore {
        async fn get(&self, _key: &str) -> Option<String> {
            None
        }
        async fn set(&self, _key: &str, _value: &str) {}
        async fn remove(&self, _key: &str) {}
        async fn keys(&self, _prefix: &str) -> Vec<String> {
            Vec::new()
        }
    }

    fn cache_with_clock() -> (ResponseCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = ResponseCache::with_clock(
            Arc::new(MemoryStore::new()),
            TtlConfig::default(),
            clock.clone(),
        );
        (cache, clock)
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let (cache, _clock) = cache_with_clock();
        let params = json!({"movieId": 603});

        let miss: Option<Vec<String>> = cache.read(Category::Details, &params).await;
        assert_eq!(miss, None);

        cache
            .write(Category::Details, &params, &vec!["a".to_string()])
            .await;
        let hit: Option<Vec<String>> = cache.read(Category::Details, &params).await;
        assert_eq!(hit, Some(vec!["a".to_string()]));
    }

    #[tokio::test]
    async fn test_read_after_ttl_expiry_misses() {
        let (cache, clock) = cache_with_clock();
        let params = json!({"mood": "happy", "page": 1});

        cache.write(Category::Recommendations, &params, &42u32).await;
        assert_eq!(
            cache.read::<u32, _>(Category::Recommendations, &params).await,
            Some(42)
        );

        clock.advance(Duration::minutes(5));
        assert_eq!(
            cache.read::<u32, _>(Category::Recommendations, &params).await,
            None
        );
    }

    #[tokio::test]
    async fn test_categories_have_independent_ttls() {
        let (cache, clock) = cache_with_clock();
        let params = json!({"id": 1});

        cache.write(Category::Recommendations, &params, &1u32).await;
        cache.write(Category::Details, &params, &2u32).await;

        clock.advance(Duration::minutes(10));

        assert_eq!(
            cache.read::<u32, _>(Category::Recommendations, &params).await,
            None
        );
        assert_eq!(cache.read::<u32, _>(Category::Details, &params).await, Some(2));
    }

    #[tokio::test]
    async fn test_invalidate_category_leaves_others() {
        let (cache, _clock) = cache_with_clock();
        let params = json!({"id": 1});

        cache.write(Category::Details, &params, &1u32).await;
        cache.write(Category::Search, &params, &2u32).await;

        cache.invalidate(Some(Category::Details)).await;

        assert_eq!(cache.read::<u32, _>(Category::Details, &params).await, None);
        assert_eq!(cache.read::<u32, _>(Category::Search, &params).await, Some(2));

        cache.invalidate(None).await;
        assert_eq!(cache.read::<u32, _>(Category::Search, &params).await, None);
    }

    #[tokio::test]
    async fn test_store_write_failure_is_silent() {
        let cache = ResponseCache::new(Arc::new(FailingStore), TtlConfig::default());
        let params = json!({"id": 1});

        cache.write(Category::Details, &params, &1u32).await;
        assert_eq!(cache.read::<u32, _>(Category::Details, &params).await, None);

        // The fetch result still reaches the caller.
        let value = cache
            .get_or_fetch(Category::Details, &params, || async { Ok(7u32) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_get_or_fetch_hits_upstream_once_until_expiry() {
        let (cache, clock) = cache_with_clock();
        let params = json!({"mood": "happy", "page": 1});
        let calls = AtomicUsize::new(0);

        let fetch = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(99u32) }
        };

        assert_eq!(
            cache
                .get_or_fetch(Category::Recommendations, &params, fetch)
                .await
                .unwrap(),
            99
        );
        assert_eq!(
            cache
                .get_or_fetch(Category::Recommendations, &params, fetch)
                .await
                .unwrap(),
            99
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::minutes(6));
        cache
            .get_or_fetch(Category::Recommendations, &params, fetch)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_cached() {
        let (cache, _clock) = cache_with_clock();
        let params = json!({"id": 550});
        let calls = AtomicUsize::new(0);

        let failing = || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<u32, _>(UpstreamError::Status {
                    status: 500,
                    message: None,
                })
            }
        };
        assert!(cache
            .get_or_fetch(Category::Details, &params, failing)
            .await
            .is_err());

        // The error was not stored; the next call fetches again.
        let value = cache
            .get_or_fetch(Category::Details, &params, || async { Ok(1u32) })
            .await
            .unwrap();
        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let (cache, _clock) = cache_with_clock();
        let params = json!({"query": "alien", "page": 1});
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_fetch = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            Ok(5u32)
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch(Category::Search, &params, || slow_fetch(calls.clone())),
            cache.get_or_fetch(Category::Search, &params, || slow_fetch(calls.clone())),
        );

        assert_eq!(a.unwrap(), 5);
        assert_eq!(b.unwrap(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_availability_cached_per_country() {
        let (cache, _clock) = cache_with_clock();
        let calls = AtomicUsize::new(0);

        for country in ["us", "gb", "us"] {
            let params = json!({"imdbId": "tt1234567", "country": country});
            let fetch = || {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(country.to_string()) }
            };
            let got = cache
                .get_or_fetch(Category::Availability, &params, fetch)
                .await
                .unwrap();
            assert_eq!(got, country);
        }

        // us and gb each fetched once; the second us request was a hit.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_make_key_layout() {
        let cache = ResponseCache::new(Arc::new(MemoryStore::new()), TtlConfig::default());
        let key = cache.make_key(Category::Details, &json!({"movieId": 603}));
        assert_eq!(key, r#"cinemood_details_{"movieId":603}"#);
    }

    #[test]
    fn test_make_key_is_order_insensitive() {
        let cache = ResponseCache::new(Arc::new(MemoryStore::new()), TtlConfig::default());

        let mut forward = serde_json::Map::new();
        forward.insert("genres".into(), json!([12, 35]));
        forward.insert("page".into(), json!(2));
        let mut reversed = serde_json::Map::new();
        reversed.insert("page".into(), json!(2));
        reversed.insert("genres".into(), json!([12, 35]));

        assert_eq!(
            cache.make_key(Category::Recommendations, &Value::Object(forward)),
            cache.make_key(Category::Recommendations, &Value::Object(reversed)),
        );
    }

    #[test]
    fn test_canonical_json_nested() {
        let value = json!({
            "b": {"z": 1, "a": [true, null]},
            "a": "x\"y",
        });
        assert_eq!(
            canonical_json(&value),
            r#"{"a":"x\"y","b":{"a":[true,null],"z":1}}"#
        );
    }

    proptest! {
        #[test]
        fn prop_distinct_param_values_make_distinct_keys(a in 1u32..10_000, b in 1u32..10_000) {
            prop_assume!(a != b);
            let cache = ResponseCache::new(Arc::new(MemoryStore::new()), TtlConfig::default());
            let key_a = cache.make_key(Category::Search, &json!({"query": "q", "page": a}));
            let key_b = cache.make_key(Category::Search, &json!({"query": "q", "page": b}));
            prop_assert_ne!(key_a, key_b);
        }

        #[test]
        fn prop_canonical_json_stable_under_insertion_order(
            pairs in prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 1..8)
        ) {
            let forward: serde_json::Map<String, Value> = pairs
                .iter()
                .map(|(k, v)| (k.clone(), json!(v)))
                .collect();
            let mut reversed = serde_json::Map::new();
            for (k, v) in pairs.iter().rev() {
                reversed.insert(k.clone(), json!(v));
            }
            prop_assert_eq!(
                canonical_json(&Value::Object(forward)),
                canonical_json(&Value::Object(reversed))
            );
        }
    }
}
