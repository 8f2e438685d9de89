use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::hash::Hash;

/// Internal cache entry with timestamp
struct CacheEntry<V> {
    data: V,
    cached_at: DateTime<Utc>,
}

/// DashMap-backed key/value cache with a fixed TTL.
///
/// Entries expire lazily: a stale entry is removed on the read that finds
/// it. The valuation and scoring cores never touch this; it belongs to the
/// data-fetch layer so repeated runs against the same ticker reuse upstream
/// responses.
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    entries: DashMap<K, CacheEntry<V>>,
    ttl_secs: i64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_secs,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        {
            let entry = self.entries.get(key)?;
            let age = (Utc::now() - entry.cached_at).num_seconds();
            if age < self.ttl_secs {
                return Some(entry.data.clone());
            }
        }
        // Stale entry, drop it
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: K, data: V) {
        self.entries.insert(
            key,
            CacheEntry {
                data,
                cached_at: Utc::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache: TtlCache<String, i32> = TtlCache::new(300);
        cache.insert("AAPL".to_string(), 42);
        assert_eq!(cache.get(&"AAPL".to_string()), Some(42));
    }

    #[test]
    fn test_miss_after_expiry() {
        // TTL of zero seconds means every entry is already stale on read
        let cache: TtlCache<String, i32> = TtlCache::new(0);
        cache.insert("AAPL".to_string(), 42);
        assert_eq!(cache.get(&"AAPL".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache: TtlCache<String, i32> = TtlCache::new(300);
        cache.insert("AAPL".to_string(), 42);
        cache.invalidate(&"AAPL".to_string());
        assert_eq!(cache.get(&"AAPL".to_string()), None);
    }
}
