//! Result cache: LRU memo of step outputs across runs.
//! Sized for phones: a few hundred JSON values at most.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Clone)]
pub struct ResultCache {
    values: HashMap<String, serde_json::Value>,
    /// Front = least recently used.
    recency: VecDeque<String>,
    capacity: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl ResultCache {
    /// A capacity of 0 disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            values: HashMap::new(),
            recency: VecDeque::new(),
            capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            self.recency.remove(pos);
        }
        self.recency.push_back(key.to_string());
    }

    pub fn get(&mut self, key: &str) -> Option<serde_json::Value> {
        match self.values.get(key).cloned() {
            Some(v) => {
                self.hits += 1;
                self.touch(key);
                Some(v)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: &str, value: serde_json::Value) {
        if self.capacity == 0 {
            return;
        }
        self.values.insert(key.to_string(), value);
        self.touch(key);
        while self.values.len() > self.capacity {
            let Some(oldest) = self.recency.pop_front() else { break };
            self.values.remove(&oldest);
            self.evictions += 1;
            tracing::debug!("🗑️ Result cache evicted '{}'", oldest);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.recency.retain(|k| k != key);
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.values.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lru_eviction() {
        let mut cache = ResultCache::new(2);
        cache.insert("a", json!(1));
        cache.insert("b", json!(2));
        // touch "a" so "b" becomes least recent
        assert_eq!(cache.get("a"), Some(json!(1)));
        cache.insert("c", json!(3));
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_hit_miss_counters() {
        let mut cache = ResultCache::new(4);
        assert!(cache.get("x").is_none());
        cache.insert("x", json!("roster"));
        assert!(cache.get("x").is_some());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_zero_capacity_disabled() {
        let mut cache = ResultCache::new(0);
        cache.insert("x", json!(1));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let mut cache = ResultCache::new(2);
        cache.insert("x", json!(1));
        cache.insert("x", json!(2));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.remove("x"), Some(json!(2)));
        cache.insert("y", json!(3));
        cache.clear();
        assert!(cache.is_empty());
    }
}
