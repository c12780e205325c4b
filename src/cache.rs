//! Bounded recency cache for precomputed aggregates.
//!
//! Fixed capacity, strict least-recently-used eviction. Entries live in a
//! slab threaded by a doubly-linked recency list, so `get`, `put` and
//! eviction are O(1).
//!
//! Key properties:
//! - One canonical key per cached artifact (`artifact_key`), shared by
//!   writers and readers
//! - Invalidation writes an explicit `CacheSlot::Invalidated` marker, so a
//!   reader can tell "never cached" from "cached, then invalidated"
//! - `get` promotes, including on an invalidated marker

use std::collections::HashMap;

use crate::models::CachedArtifact;

/// Build the canonical cache key for an artifact about one entity.
pub fn artifact_key(artifact: CachedArtifact, id: i64) -> String {
    format!("{}_{}", artifact.as_str(), id)
}

// ═══════════════════════════════════════════════════════════
// CacheSlot: value or invalidation marker
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum CacheSlot<V> {
    Value(V),
    Invalidated,
}

impl<V> CacheSlot<V> {
    pub fn value(&self) -> Option<&V> {
        match self {
            Self::Value(v) => Some(v),
            Self::Invalidated => None,
        }
    }

    pub fn is_invalidated(&self) -> bool {
        matches!(self, Self::Invalidated)
    }
}

struct Node<V> {
    key: String,
    slot: CacheSlot<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

// ═══════════════════════════════════════════════════════════
// RecencyCache
// ═══════════════════════════════════════════════════════════

pub struct RecencyCache<V> {
    capacity: usize,
    index: HashMap<String, usize>,
    nodes: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    /// Least recently used.
    head: Option<usize>,
    /// Most recently used.
    tail: Option<usize>,
}

impl<V> RecencyCache<V> {
    /// Create an empty cache. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether a slot exists for `key`. Does not promote.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Look up `key` and mark it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&CacheSlot<V>> {
        let idx = *self.index.get(key)?;
        self.promote(idx);
        self.nodes[idx].as_ref().map(|node| &node.slot)
    }

    /// Store a value. Returns the key evicted to make room, if any.
    pub fn put(&mut self, key: impl Into<String>, value: V) -> Option<String> {
        self.put_slot(key.into(), CacheSlot::Value(value))
    }

    /// Replace an existing entry with the invalidation marker.
    ///
    /// Keys with no slot are left alone: there is nothing stale to hide,
    /// and writing a marker would only push a live entry out.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        if let Some(node) = self.nodes[idx].as_mut() {
            node.slot = CacheSlot::Invalidated;
        }
        self.promote(idx);
        true
    }

    /// Store the invalidation marker under `key` whether or not it exists.
    pub fn put_invalidated(&mut self, key: impl Into<String>) -> Option<String> {
        self.put_slot(key.into(), CacheSlot::Invalidated)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let Some(node) = self.nodes[idx].as_ref() else {
                break;
            };
            keys.push(node.key.as_str());
            cursor = node.next;
        }
        keys
    }

    // ── Internals ────────────────────────────────────────

    fn put_slot(&mut self, key: String, slot: CacheSlot<V>) -> Option<String> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.nodes[idx].as_mut() {
                node.slot = slot;
            }
            self.promote(idx);
            return None;
        }

        let evicted = if self.index.len() >= self.capacity {
            self.evict_lru()
        } else {
            None
        };

        let node = Node {
            key: key.clone(),
            slot,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.push_back(idx);
        evicted
    }

    fn evict_lru(&mut self) -> Option<String> {
        let idx = self.head?;
        self.detach(idx);
        let node = self.nodes[idx].take()?;
        self.free.push(idx);
        self.index.remove(&node.key);
        tracing::debug!(key = %node.key, "Evicted least recently used cache entry");
        Some(node.key)
    }

    fn promote(&mut self, idx: usize) {
        if self.tail == Some(idx) {
            return;
        }
        self.detach(idx);
        self.push_back(idx);
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.nodes[idx].as_mut() {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(node) = self.nodes[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.nodes[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn push_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(t) => {
                if let Some(node) = self.nodes[t].as_mut() {
                    node.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, keys: &[&str]) -> RecencyCache<u32> {
        let mut cache = RecencyCache::new(capacity);
        for (i, key) in keys.iter().enumerate() {
            cache.put(*key, i as u32);
        }
        cache
    }

    #[test]
    fn new_cache_is_empty() {
        let cache: RecencyCache<u32> = RecencyCache::new(4);
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), 4);
    }

    #[test]
    fn zero_capacity_raised_to_one() {
        let mut cache = RecencyCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b"));
    }

    #[test]
    fn missing_key_returns_none() {
        let mut cache: RecencyCache<u32> = RecencyCache::new(2);
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn overflow_evicts_exactly_the_lru_key() {
        let mut cache = filled(3, &["a", "b", "c"]);
        let evicted = cache.put("d", 3);
        assert_eq!(evicted.as_deref(), Some("a"));
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b") && cache.contains("c") && cache.contains("d"));
    }

    #[test]
    fn get_promotes_key_past_new_insertions() {
        let mut cache = filled(3, &["a", "b", "c"]);
        assert_eq!(cache.get("a").and_then(CacheSlot::value), Some(&0));

        // N-1 new keys must not push out the promoted one
        cache.put("d", 3);
        cache.put("e", 4);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(!cache.contains("c"));
    }

    #[test]
    fn put_existing_overwrites_and_promotes() {
        let mut cache = filled(3, &["a", "b", "c"]);
        assert_eq!(cache.put("a", 99), None);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.keys_by_recency(), vec!["b", "c", "a"]);

        let evicted = cache.put("d", 3);
        assert_eq!(evicted.as_deref(), Some("b"));
        assert_eq!(cache.get("a").and_then(CacheSlot::value), Some(&99));
    }

    #[test]
    fn invalidated_marker_is_distinguishable() {
        let mut cache = filled(2, &["user_summary_1"]);
        assert!(cache.invalidate("user_summary_1"));

        let slot = cache.get("user_summary_1").unwrap();
        assert!(slot.is_invalidated());
        assert!(slot.value().is_none());
        assert!(cache.get("user_summary_2").is_none());
    }

    #[test]
    fn invalidate_missing_key_is_noop() {
        let mut cache = filled(2, &["a", "b"]);
        assert!(!cache.invalidate("c"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys_by_recency(), vec!["a", "b"]);
    }

    #[test]
    fn put_invalidated_counts_toward_capacity() {
        let mut cache = filled(2, &["a", "b"]);
        let evicted = cache.put_invalidated("c");
        assert_eq!(evicted.as_deref(), Some("a"));
        assert!(cache.get("c").unwrap().is_invalidated());
    }

    #[test]
    fn get_on_marker_promotes() {
        let mut cache = filled(2, &["a", "b"]);
        cache.invalidate("a");
        cache.get("b");
        cache.get("a");
        let evicted = cache.put("c", 5);
        assert_eq!(evicted.as_deref(), Some("b"));
    }

    #[test]
    fn slots_are_reused_after_eviction() {
        let mut cache = RecencyCache::new(2);
        for i in 0..100u32 {
            cache.put(format!("k{i}"), i);
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.nodes.len() <= 2);
        assert_eq!(cache.keys_by_recency(), vec!["k98", "k99"]);
    }

    #[test]
    fn clear_removes_everything() {
        let mut cache = filled(3, &["a", "b"]);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys_by_recency().is_empty());
        cache.put("c", 1);
        assert_eq!(cache.keys_by_recency(), vec!["c"]);
    }

    #[test]
    fn artifact_key_is_kind_and_id() {
        assert_eq!(artifact_key(CachedArtifact::UserSummary, 42), "user_summary_42");
    }
}
