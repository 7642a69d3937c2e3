//! LRU cache with lazy TTL expiry for search results.
//!
//! Entries live in a dense vector and are linked most-recently-used first by
//! index, with a hash map from key to index for O(1) access. Removing an entry
//! swaps the last node into its slot and patches the links that pointed at it.
//!
//! Expiry is checked on access only; nothing runs in the background. Callers
//! wanting proactive cleanup call [`LruCache::clean_expired`].
//!
//! The cache is not internally synchronized. A map update and the list relink
//! that follows it are separate steps, so shared use needs an external lock.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use tracing::trace;

/// Configuration for the result cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Entries not accessed for longer than this are treated as absent.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            max_capacity: 100,
        }
    }
}

impl CacheConfig {
    /// Create a config with the given TTL and capacity.
    pub fn new(ttl: Duration, max_capacity: usize) -> Self {
        Self { ttl, max_capacity }
    }

    /// Capacity as a non-zero value, if valid.
    pub fn capacity(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.max_capacity)
    }
}

/// Source of the current time, injectable for tests.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hit/miss counters and occupancy.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before any lookup.
    pub hit_rate: f64,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
    /// Inserted or last accessed at.
    touched_at: Instant,
}

/// Least-recently-used cache with time-to-live.
#[derive(Debug, Clone)]
pub struct LruCache<K, V, C = SystemClock> {
    nodes: Vec<Node<K, V>>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: NonZeroUsize,
    ttl: Duration,
    hits: u64,
    misses: u64,
    clock: C,
}

impl<K, V> LruCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty cache using the system clock.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, SystemClock)
    }
}

impl<K, V, C> LruCache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Create an empty cache reading time from `clock`.
    pub fn with_clock(capacity: NonZeroUsize, ttl: Duration, clock: C) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity.get()),
            index: HashMap::with_capacity(capacity.get()),
            head: None,
            tail: None,
            capacity,
            ttl,
            hits: 0,
            misses: 0,
            clock,
        }
    }

    /// Look up a value, refreshing its recency and timestamp.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&idx) = self.index.get(key) else {
            self.misses += 1;
            return None;
        };

        let now = self.clock.now();
        if self.is_expired(idx, now) {
            self.remove_at(idx);
            self.misses += 1;
            trace!(len = self.nodes.len(), "cache entry expired on access");
            return None;
        }

        self.move_to_front(idx);
        self.nodes[idx].touched_at = now;
        self.hits += 1;
        Some(&self.nodes[idx].value)
    }

    /// Insert or replace a value, evicting the least recently used entry if full.
    pub fn set(&mut self, key: K, value: V) {
        let now = self.clock.now();

        if let Some(&idx) = self.index.get(&key) {
            let node = &mut self.nodes[idx];
            node.value = value;
            node.touched_at = now;
            self.move_to_front(idx);
            return;
        }

        if self.nodes.len() >= self.capacity.get()
            && let Some(tail) = self.tail
        {
            self.remove_at(tail);
            trace!(capacity = self.capacity.get(), "evicted least recently used entry");
        }

        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
            touched_at: now,
        });
        self.index.insert(key, idx);
        self.link_front(idx);
    }

    /// Whether a live entry exists. Does not affect recency or statistics.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index
            .get(key)
            .is_some_and(|&idx| !self.is_expired(idx, self.clock.now()))
    }

    /// Remove an entry. Returns whether it was present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&idx) => {
                self.remove_at(idx);
                true
            }
            None => false,
        }
    }

    /// Remove every entry and reset the hit/miss counters.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
        self.hits = 0;
        self.misses = 0;
    }

    /// Remove all expired entries. Returns how many were removed.
    pub fn clean_expired(&mut self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        let mut idx = 0;
        while idx < self.nodes.len() {
            if self.is_expired(idx, now) {
                // The last node moves into `idx`, so re-check the same slot
                self.remove_at(idx);
                removed += 1;
            } else {
                idx += 1;
            }
        }

        if removed > 0 {
            trace!(removed, "cleaned expired cache entries");
        }
        removed
    }

    /// Number of entries, including expired ones not yet cleaned.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            keys.push(&self.nodes[idx].key);
            cursor = self.nodes[idx].next;
        }
        keys
    }

    /// Occupancy and hit-rate statistics.
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        };

        CacheStats {
            len: self.nodes.len(),
            capacity: self.capacity.get(),
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            ttl: self.ttl,
        }
    }

    /// A clock reading earlier than the entry's timestamp counts as expired.
    fn is_expired(&self, idx: usize, now: Instant) -> bool {
        match now.checked_duration_since(self.nodes[idx].touched_at) {
            Some(age) => age > self.ttl,
            None => true,
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    fn link_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        match self.head {
            Some(head) => self.nodes[head].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    /// Unlink and drop the node at `idx`, keeping the vector dense.
    fn remove_at(&mut self, idx: usize) {
        self.unlink(idx);
        self.index.remove(&self.nodes[idx].key);

        let last = self.nodes.len() - 1;
        self.nodes.swap_remove(idx);
        if idx == last {
            return;
        }

        // The node previously at `last` now lives at `idx`
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = Some(idx),
            None => self.head = Some(idx),
        }
        match next {
            Some(n) => self.nodes[n].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        if let Some(slot) = self.index.get_mut(&self.nodes[idx].key) {
            *slot = idx;
        }
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use super::Clock;

    /// Clock that only moves when told to.
    ///
    /// Starts an hour after its base instant so it can also be wound back.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        base: Instant,
        offset: Rc<Cell<Duration>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Rc::new(Cell::new(Duration::from_secs(3600))),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.offset.set(self.offset.get() + by);
        }

        pub fn rewind(&self, by: Duration) {
            self.offset.set(self.offset.get().saturating_sub(by));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + self.offset.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::ManualClock;
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    fn cache(capacity: usize) -> (LruCache<String, u32, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let cache = LruCache::with_clock(NonZeroUsize::new(capacity).unwrap(), TTL, clock.clone());
        (cache, clock)
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.max_capacity, 100);
        assert!(config.capacity().is_some());
        assert!(CacheConfig::new(TTL, 0).capacity().is_none());
    }

    #[test]
    fn evicts_least_recently_used() {
        let (mut cache, _) = cache(2);
        cache.set("x".to_string(), 1);
        cache.set("y".to_string(), 2);
        cache.set("z".to_string(), 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("x"), None);
        assert_eq!(cache.get("y"), Some(&2));
        assert_eq!(cache.get("z"), Some(&3));
    }

    #[test]
    fn get_refreshes_recency() {
        let (mut cache, _) = cache(2);
        cache.set("x".to_string(), 1);
        cache.set("y".to_string(), 2);
        assert_eq!(cache.get("x"), Some(&1));
        cache.set("z".to_string(), 3);

        assert!(cache.has("x"));
        assert!(!cache.has("y"));
        assert!(cache.has("z"));
    }

    #[test]
    fn set_existing_updates_without_eviction() {
        let (mut cache, _) = cache(2);
        cache.set("x".to_string(), 1);
        cache.set("y".to_string(), 2);
        cache.set("x".to_string(), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec!["x", "y"]);
        assert_eq!(cache.get("x"), Some(&10));
    }

    #[test]
    fn keys_in_recency_order() {
        let (mut cache, _) = cache(3);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("c".to_string(), 3);
        assert_eq!(cache.keys(), vec!["c", "b", "a"]);

        cache.get("a");
        assert_eq!(cache.keys(), vec!["a", "c", "b"]);
    }

    #[test]
    fn expired_entry_is_a_miss_and_removed() {
        let (mut cache, clock) = cache(4);
        cache.set("x".to_string(), 1);
        cache.set("y".to_string(), 2);

        clock.advance(TTL + Duration::from_secs(1));
        assert!(!cache.has("x"));
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.get("x"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn entry_at_exact_ttl_is_live() {
        let (mut cache, clock) = cache(4);
        cache.set("x".to_string(), 1);
        clock.advance(TTL);
        assert_eq!(cache.get("x"), Some(&1));
    }

    #[test]
    fn access_refreshes_ttl() {
        let (mut cache, clock) = cache(4);
        cache.set("x".to_string(), 1);
        clock.advance(Duration::from_secs(40));
        assert_eq!(cache.get("x"), Some(&1));
        clock.advance(Duration::from_secs(40));
        assert_eq!(cache.get("x"), Some(&1));
    }

    #[test]
    fn clock_skew_degrades_to_miss() {
        let (mut cache, clock) = cache(4);
        cache.set("x".to_string(), 1);
        clock.rewind(Duration::from_secs(10));
        assert_eq!(cache.get("x"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn eviction_ignores_ttl() {
        let (mut cache, clock) = cache(2);
        cache.set("old".to_string(), 1);
        clock.advance(Duration::from_secs(30));
        cache.set("new".to_string(), 2);
        // "old" is the LRU entry even though both are live
        cache.set("newest".to_string(), 3);
        assert_eq!(cache.keys(), vec!["newest", "new"]);
    }

    #[test]
    fn clean_expired_sweeps_everything_stale() {
        let (mut cache, clock) = cache(5);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        clock.advance(Duration::from_secs(45));
        cache.set("c".to_string(), 3);
        cache.set("d".to_string(), 4);
        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.clean_expired(), 2);
        assert_eq!(cache.keys(), vec!["d", "c"]);
        assert_eq!(cache.clean_expired(), 0);
    }

    #[test]
    fn delete_and_clear() {
        let (mut cache, _) = cache(3);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("c".to_string(), 3);

        assert!(cache.delete("b"));
        assert!(!cache.delete("b"));
        assert_eq!(cache.keys(), vec!["c", "a"]);

        cache.get("a");
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys().is_empty());
        assert_eq!(cache.stats().hits, 0);

        // Still usable after clearing
        cache.set("z".to_string(), 9);
        assert_eq!(cache.get("z"), Some(&9));
    }

    #[test]
    fn delete_head_and_tail_keeps_links() {
        let (mut cache, _) = cache(4);
        for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
            cache.set(key.to_string(), i as u32);
        }
        assert!(cache.delete("d"));
        assert!(cache.delete("a"));
        assert_eq!(cache.keys(), vec!["c", "b"]);
        cache.set("e".to_string(), 5);
        assert_eq!(cache.keys(), vec!["e", "c", "b"]);
    }

    #[test]
    fn hit_rate() {
        let (mut cache, _) = cache(2);
        assert_eq!(cache.stats().hit_rate, 0.0);

        cache.set("a".to_string(), 1);
        cache.get("a");
        cache.get("a");
        cache.get("a");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.75).abs() < 1e-9);
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.len, 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::test_clock::ManualClock;
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Set(u8),
        Get(u8),
        Delete(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..8).prop_map(Op::Set),
            (0u8..8).prop_map(Op::Get),
            (0u8..8).prop_map(Op::Delete),
        ]
    }

    proptest! {
        /// Size never exceeds capacity, and the recency list matches the map
        #[test]
        fn bounded_and_consistent(capacity in 1usize..5, ops in proptest::collection::vec(op(), 0..60)) {
            let clock = ManualClock::new();
            let mut cache = LruCache::with_clock(
                NonZeroUsize::new(capacity).unwrap(),
                Duration::from_secs(60),
                clock,
            );

            for op in ops {
                match op {
                    Op::Set(k) => cache.set(k, u32::from(k)),
                    Op::Get(k) => {
                        if let Some(v) = cache.get(&k) {
                            prop_assert_eq!(*v, u32::from(k));
                        }
                    }
                    Op::Delete(k) => {
                        cache.delete(&k);
                    }
                }
                prop_assert!(cache.len() <= capacity);
                prop_assert_eq!(cache.keys().len(), cache.len());
            }
        }

        /// The most recently set key is always at the head
        #[test]
        fn last_set_is_most_recent(keys in proptest::collection::vec(0u8..6, 1..30)) {
            let mut cache = LruCache::new(NonZeroUsize::new(3).unwrap(), Duration::from_secs(60));
            for k in &keys {
                cache.set(*k, ());
                prop_assert_eq!(cache.keys()[0], k);
            }
        }
    }
}
