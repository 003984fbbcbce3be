//! In-Memory Reputation Cache
//!
//! Thread-safe key/value store shared by the evidence lookup components.
//! Entries expire after a per-entry TTL (lazily evicted on access) and the
//! store is capacity-bounded with FIFO eviction: when full, the
//! oldest-inserted entry goes first, regardless of how recently it was
//! read. Keys are addresses and are normalized to lowercase, so two
//! differently-cased spellings of the same address share one entry.
//!
//! The cache has no persistence; it is rebuilt on every process start.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache entry with creation time for TTL validation
#[derive(Clone, Debug)]
struct CacheEntry<T> {
    value: T,
    created_at: Instant,
    ttl_secs: u64,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > Duration::from_secs(self.ttl_secs)
    }

    fn remaining_ttl(&self) -> u64 {
        self.ttl_secs.saturating_sub(self.created_at.elapsed().as_secs())
    }
}

/// Bounded, TTL-aware reputation cache.
///
/// Cloning shares the underlying store, so one instance can be handed to
/// several lookup components.
#[derive(Clone)]
pub struct ReputationCache<T: Clone> {
    /// lowercase key -> entry
    store: Arc<DashMap<String, CacheEntry<T>>>,
    /// Insertion order for FIFO eviction. May hold keys already removed
    /// from the store; eviction skips those.
    order: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
    default_ttl_secs: u64,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl<T: Clone> ReputationCache<T> {
    pub fn new(capacity: usize, default_ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            order: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
            default_ttl_secs,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Normalize a key to lowercase
    #[inline]
    fn normalize_key(key: &str) -> String {
        key.to_lowercase()
    }

    /// Get a value; an entry past its TTL counts as absent and is evicted.
    pub fn get(&self, key: &str) -> Option<T> {
        let key = Self::normalize_key(key);

        if let Some(entry) = self.store.get(&key) {
            if entry.is_expired() {
                drop(entry); // release read lock before removal
                self.store.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("cache miss (expired): {}", key);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("cache hit: {} (ttl {}s remaining)", key, entry.remaining_ttl());
                Some(entry.value.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("cache miss: {}", key);
            None
        }
    }

    /// Insert with the default TTL
    pub fn set(&self, key: &str, value: T) {
        self.set_with_ttl(key, value, self.default_ttl_secs);
    }

    /// Insert with an explicit TTL. Re-inserting an existing key replaces
    /// its value and refreshes its TTL but keeps its original FIFO slot.
    pub fn set_with_ttl(&self, key: &str, value: T, ttl_secs: u64) {
        let key = Self::normalize_key(key);
        let entry = CacheEntry {
            value,
            created_at: Instant::now(),
            ttl_secs,
        };

        let existing = self.store.insert(key.clone(), entry);
        if existing.is_none() {
            let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
            order.push_back(key);
            while self.store.len() > self.capacity {
                match order.pop_front() {
                    // A popped key may already be gone (expired); only a
                    // live removal counts toward the eviction.
                    Some(oldest) => {
                        if self.store.remove(&oldest).is_some() {
                            debug!("cache evict (fifo): {}", oldest);
                        }
                    }
                    None => break,
                }
            }
        }
    }

    /// TTL-aware membership check; expired entries are evicted lazily.
    pub fn has(&self, key: &str) -> bool {
        let key = Self::normalize_key(key);
        match self.store.get(&key) {
            Some(entry) if entry.is_expired() => {
                drop(entry);
                self.store.remove(&key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn clear(&self) {
        self.store.clear();
        self.order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        before - self.store.len()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            capacity: self.capacity,
            hits,
            misses,
            hit_rate,
            default_ttl_secs: self.default_ttl_secs,
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub default_ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ReputationCache<String> {
        ReputationCache::new(100, 300)
    }

    #[test]
    fn test_set_get() {
        let cache = cache();
        cache.set("0xdAC17F958D2ee523a2206206994597C13D831ec7", "safe".to_string());
        assert_eq!(
            cache.get("0xdAC17F958D2ee523a2206206994597C13D831ec7"),
            Some("safe".to_string())
        );
    }

    #[test]
    fn test_key_normalization() {
        let cache = cache();
        cache.set(
            "0xDAC17F958D2EE523A2206206994597C13D831EC7",
            "safe".to_string(),
        );
        assert!(cache.has("0xdac17f958d2ee523a2206206994597c13d831ec7"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_miss() {
        let cache = cache();
        assert_eq!(cache.get("0x1234567890123456789012345678901234567890"), None);
        assert!(!cache.has("0x1234567890123456789012345678901234567890"));
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = cache();
        cache.set_with_ttl("0xaaa", "stale".to_string(), 0);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get("0xaaa"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_has_evicts_expired() {
        let cache = cache();
        cache.set_with_ttl("0xaaa", "stale".to_string(), 0);
        std::thread::sleep(Duration::from_millis(10));
        assert!(!cache.has("0xaaa"));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_fifo_eviction() {
        let cache = ReputationCache::new(2, 300);
        cache.set("0xaaa", "a".to_string());
        cache.set("0xbbb", "b".to_string());
        cache.set("0xccc", "c".to_string());

        // Oldest-inserted goes first, not least-recently-used
        assert!(!cache.has("0xaaa"));
        assert!(cache.has("0xbbb"));
        assert!(cache.has("0xccc"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reinsert_keeps_fifo_slot() {
        let cache = ReputationCache::new(2, 300);
        cache.set("0xaaa", "a1".to_string());
        cache.set("0xaaa", "a2".to_string());
        cache.set("0xbbb", "b".to_string());
        cache.set("0xccc", "c".to_string());

        assert!(!cache.has("0xaaa"));
        assert_eq!(cache.get("0xbbb"), Some("b".to_string()));
        assert_eq!(cache.get("0xccc"), Some("c".to_string()));
    }

    #[test]
    fn test_per_entry_ttl_override() {
        let cache = cache();
        cache.set_with_ttl("0xaaa", "short".to_string(), 0);
        cache.set("0xbbb", "long".to_string());
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get("0xaaa"), None);
        assert_eq!(cache.get("0xbbb"), Some("long".to_string()));
    }

    #[test]
    fn test_stats() {
        let cache = cache();
        cache.set("0xaaa", "a".to_string());
        cache.get("0xaaa"); // hit
        cache.get("0xbbb"); // miss

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear() {
        let cache = cache();
        cache.set("0xaaa", "a".to_string());
        cache.clear();
        assert!(cache.is_empty());
    }
}
