//! TTL cache with FIFO capacity eviction
//!
//! Entries live for a fixed TTL and are never served past expiry. When the
//! item cap is reached, the oldest *inserted* entry is evicted first - a
//! cache hit does not refresh an entry's position, so eviction order is
//! strictly insertion order.

use crate::source::Operation;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache key for market-data requests
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Upper-cased ticker symbol
    pub symbol: String,
    /// Operation name
    pub operation: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(symbol: &str, operation: Operation) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            operation: operation.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.symbol, self.operation)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    created_at: Instant,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    // Insertion order; front is the oldest entry
    order: VecDeque<CacheKey>,
}

/// Thread-safe market-data cache
pub struct MarketCache {
    inner: Arc<RwLock<CacheInner>>,
    ttl: Duration,
    capacity: usize,
}

impl MarketCache {
    /// Create a new cache with the given TTL and item capacity
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::default())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Get a value from the cache
    ///
    /// Expired entries are removed on access and reported as a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }

        tracing::debug!("Cache expired for {}", key);
        inner.entries.remove(key);
        inner.order.retain(|k| k != key);
        None
    }

    /// Insert a value into the cache
    ///
    /// Re-inserting an existing key replaces the value and refreshes its
    /// TTL but keeps its FIFO position. New keys beyond capacity evict the
    /// oldest entry first.
    pub async fn insert(&self, key: CacheKey, value: serde_json::Value) {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            created_at: now,
            expires_at: now + self.ttl,
        };

        if inner.entries.insert(key.clone(), entry).is_none() {
            inner.order.push_back(key);
            while inner.entries.len() > self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    tracing::debug!("Cache capacity reached, evicting {}", oldest);
                    inner.entries.remove(&oldest);
                } else {
                    break;
                }
            }
        }
    }

    /// Clear all cached entries, returning how many were removed
    pub async fn clear(&self) -> usize {
        let mut inner = self.inner.write().await;
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        removed
    }

    /// Get the number of cached entries (including not-yet-purged expired ones)
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.entries.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot cache occupancy and per-entry expiry for the admin surface
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        let now = Instant::now();

        let mut entries: Vec<CacheEntryStats> = inner
            .order
            .iter()
            .filter_map(|key| {
                let entry = inner.entries.get(key)?;
                let age = now.duration_since(entry.created_at);
                let expired = entry.expires_at <= now;
                Some(CacheEntryStats {
                    key: key.to_string(),
                    age_seconds: age.as_secs_f64(),
                    expires_in_seconds: if expired {
                        0.0
                    } else {
                        entry.expires_at.duration_since(now).as_secs_f64()
                    },
                    expired,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.age_seconds.total_cmp(&a.age_seconds));

        CacheStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            ttl_seconds: self.ttl.as_secs(),
            entries,
        }
    }
}

impl Clone for MarketCache {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            ttl: self.ttl,
            capacity: self.capacity,
        }
    }
}

/// Cache statistics for the admin surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,
    /// Maximum number of entries
    pub capacity: usize,
    /// Configured TTL
    pub ttl_seconds: u64,
    /// Per-entry details, oldest first
    pub entries: Vec<CacheEntryStats>,
}

/// Per-entry cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryStats {
    /// `SYMBOL:operation` key
    pub key: String,
    /// Seconds since insertion
    pub age_seconds: f64,
    /// Seconds until expiry (0 when already expired)
    pub expires_in_seconds: f64,
    /// Whether the entry is past its TTL
    pub expired: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(symbol: &str) -> CacheKey {
        CacheKey::new(symbol, Operation::CompanyProfile)
    }

    #[test]
    fn test_cache_key_uppercases_symbol() {
        let key = CacheKey::new("aapl", Operation::QuarterlyIncome);
        assert_eq!(key.symbol, "AAPL");
        assert_eq!(key.operation, "quarterly_income");
        assert_eq!(key.to_string(), "AAPL:quarterly_income");
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = MarketCache::new(Duration::from_secs(60), 10);
        let value = json!({"price": 150.0});

        cache.insert(key("AAPL"), value.clone()).await;

        assert_eq!(cache.get(&key("AAPL")).await, Some(value));
        assert!(cache.get(&key("MSFT")).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_not_served() {
        let cache = MarketCache::new(Duration::from_millis(20), 10);
        cache.insert(key("AAPL"), json!({"price": 150.0})).await;

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.get(&key("AAPL")).await.is_none());
        // Expired entry was purged on access
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_fifo_eviction_oldest_first() {
        let cache = MarketCache::new(Duration::from_secs(60), 3);

        for symbol in ["A", "B", "C"] {
            cache.insert(key(symbol), json!(symbol)).await;
        }
        // Reading "A" must not protect it from eviction
        assert!(cache.get(&key("A")).await.is_some());

        cache.insert(key("D"), json!("D")).await;

        assert_eq!(cache.len().await, 3);
        assert!(cache.get(&key("A")).await.is_none());
        assert!(cache.get(&key("B")).await.is_some());
        assert!(cache.get(&key("D")).await.is_some());
    }

    #[tokio::test]
    async fn test_capacity_never_exceeded() {
        let cache = MarketCache::new(Duration::from_secs(60), 5);

        for i in 0..20 {
            cache.insert(key(&format!("SYM{i}")), json!(i)).await;
            assert!(cache.len().await <= 5);
        }
        assert_eq!(cache.len().await, 5);
        // The five most recently inserted survive
        for i in 15..20 {
            assert!(cache.get(&key(&format!("SYM{i}"))).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_reinsert_keeps_fifo_position() {
        let cache = MarketCache::new(Duration::from_secs(60), 2);

        cache.insert(key("A"), json!(1)).await;
        cache.insert(key("B"), json!(2)).await;
        // Overwrite A; it stays the oldest entry
        cache.insert(key("A"), json!(10)).await;
        cache.insert(key("C"), json!(3)).await;

        assert!(cache.get(&key("A")).await.is_none());
        assert_eq!(cache.get(&key("B")).await, Some(json!(2)));
        assert_eq!(cache.get(&key("C")).await, Some(json!(3)));
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let cache = MarketCache::new(Duration::from_secs(300), 10);

        cache.insert(key("AAPL"), json!(1)).await;
        cache.insert(key("MSFT"), json!(2)).await;

        let stats = cache.stats().await;
        assert_eq!(stats.size, 2);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.ttl_seconds, 300);
        assert_eq!(stats.entries.len(), 2);
        assert!(!stats.entries[0].expired);
        assert!(stats.entries[0].expires_in_seconds > 0.0);

        assert_eq!(cache.clear().await, 2);
        assert!(cache.is_empty().await);
    }
}
