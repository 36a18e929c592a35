//! Time-bounded key/value store shared by the resolution components.
//!
//! Expiry is lazy: `get` compares the entry age against its TTL and reports
//! a miss once the TTL is reached, but leaves the entry in place. A later
//! `set` overwrites it, and `purge_expired` can drop stale entries in bulk.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use orderly_core::ResolvedOrder;
use tokio::time::Instant;

use super::namespace::{CacheTtls, Namespace};
use super::stats::{CacheStats, Counters};

/// Value stored in the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Order(Arc<ResolvedOrder>),
    Flag(bool),
}

impl CacheValue {
    pub fn as_order(&self) -> Option<&Arc<ResolvedOrder>> {
        match self {
            CacheValue::Order(order) => Some(order),
            CacheValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            CacheValue::Flag(flag) => Some(*flag),
            CacheValue::Order(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    namespace: Namespace,
    key: String,
}

impl CacheKey {
    fn new(namespace: Namespace, key: &str) -> Self {
        Self {
            namespace,
            key: key.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CacheValue,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// Concurrent, namespaced TTL cache.
///
/// Safe for concurrent readers and writers. Every operation is synchronous
/// and in-memory; no map guard is ever held across an `.await`.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttls: CacheTtls,
    counters: [Counters; 3],
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(CacheTtls::default())
    }
}

impl ResolutionCache {
    /// Create an empty cache with the given namespace TTLs.
    pub fn new(ttls: CacheTtls) -> Self {
        Self {
            entries: DashMap::new(),
            ttls,
            counters: Default::default(),
        }
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    /// Look up a live entry.
    ///
    /// Returns `None` when the key is absent or its age has reached the TTL.
    pub fn get(&self, namespace: Namespace, key: &str) -> Option<CacheValue> {
        let now = Instant::now();
        let value = self
            .entries
            .get(&CacheKey::new(namespace, key))
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());

        let counters = &self.counters[namespace.index()];
        if value.is_some() {
            counters.hit();
        } else {
            counters.miss();
        }
        value
    }

    /// Store a value with the namespace's default TTL.
    pub fn set(&self, namespace: Namespace, key: &str, value: CacheValue) {
        self.set_with_ttl(namespace, key, value, self.ttls.for_namespace(namespace));
    }

    /// Store a value with an explicit TTL.
    pub fn set_with_ttl(&self, namespace: Namespace, key: &str, value: CacheValue, ttl: Duration) {
        self.entries.insert(
            CacheKey::new(namespace, key),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Remove one entry. Returns whether anything was removed.
    pub fn invalidate(&self, namespace: Namespace, key: &str) -> bool {
        self.entries.remove(&CacheKey::new(namespace, key)).is_some()
    }

    /// Remove every entry in `namespace` matching `predicate`.
    ///
    /// Returns the number of removed entries.
    pub fn invalidate_where<F>(&self, namespace: Namespace, predicate: F) -> u64
    where
        F: Fn(&str, &CacheValue) -> bool,
    {
        let mut removed = 0;
        self.entries.retain(|k, entry| {
            let remove = k.namespace == namespace && predicate(&k.key, &entry.value);
            if remove {
                removed += 1;
            }
            !remove
        });
        removed
    }

    /// Remove every entry in one namespace.
    pub fn clear(&self, namespace: Namespace) -> u64 {
        self.invalidate_where(namespace, |_, _| true)
    }

    /// Remove every entry and reset statistics.
    pub fn clear_all(&self) {
        self.entries.clear();
        for counters in &self.counters {
            counters.reset();
        }
    }

    /// Drop entries whose TTL has elapsed. Never required for correctness.
    pub fn purge_expired(&self) -> u64 {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = entry.is_live(now);
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    /// Number of stored entries in a namespace, expired ones included.
    pub fn len(&self, namespace: Namespace) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key().namespace == namespace)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for namespace in Namespace::ALL {
            let (hits, misses) = self.counters[namespace.index()].load();
            let ns = stats.namespace_mut(namespace);
            ns.hits = hits;
            ns.misses = misses;
        }
        for entry in self.entries.iter() {
            stats.namespace_mut(entry.key().namespace).entry_count += 1;
        }
        stats
    }

    // ========================================================================
    // TYPED HELPERS
    // ========================================================================

    /// Cached order for an identifier, if live.
    pub fn get_order(&self, key: &str) -> Option<Arc<ResolvedOrder>> {
        self.get(Namespace::Entity, key)
            .and_then(|value| value.as_order().cloned())
    }

    /// Cache a resolved order under `key`.
    ///
    /// Synthetic placeholders are refused so the entity namespace only ever
    /// holds backend records. Returns whether the order was stored.
    pub fn put_order(&self, key: &str, order: Arc<ResolvedOrder>) -> bool {
        if order.is_synthetic {
            return false;
        }
        self.set(Namespace::Entity, key, CacheValue::Order(order));
        true
    }

    /// Cached boolean in `namespace`, if live.
    pub fn get_flag(&self, namespace: Namespace, key: &str) -> Option<bool> {
        self.get(namespace, key).and_then(|value| value.as_flag())
    }

    pub fn set_flag(&self, namespace: Namespace, key: &str, flag: bool) {
        self.set(namespace, key, CacheValue::Flag(flag));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Arc<ResolvedOrder> {
        let mut order = ResolvedOrder::synthetic("seed");
        order.is_synthetic = false;
        Arc::new(order)
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_returns_live_entry() {
        let cache = ResolutionCache::default();
        cache.set_flag(Namespace::Relationship, "u1|e1", false);

        assert_eq!(cache.get_flag(Namespace::Relationship, "u1|e1"), Some(false));
        assert_eq!(cache.get_flag(Namespace::Entity, "u1|e1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_at_ttl() {
        let cache = ResolutionCache::new(
            CacheTtls::default().with_entity_ttl(Duration::from_secs(120)),
        );
        cache.put_order("a1b2c3d4", order());

        tokio::time::advance(Duration::from_secs(119)).await;
        assert!(cache.get_order("a1b2c3d4").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get_order("a1b2c3d4").is_none());
        // Lazy expiry: the stale entry is still stored.
        assert_eq!(cache.len(Namespace::Entity), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_expired_entry() {
        let cache = ResolutionCache::default();
        cache.set_with_ttl(
            Namespace::Capability,
            "orders.reference_number",
            CacheValue::Flag(false),
            Duration::from_secs(1),
        );
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get_flag(Namespace::Capability, "orders.reference_number"), None);

        cache.set_flag(Namespace::Capability, "orders.reference_number", true);
        assert_eq!(
            cache.get_flag(Namespace::Capability, "orders.reference_number"),
            Some(true)
        );
        assert_eq!(cache.len(Namespace::Capability), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_order_refuses_synthetic() {
        let cache = ResolutionCache::default();
        let stored = cache.put_order("zz", Arc::new(ResolvedOrder::synthetic("zz")));
        assert!(!stored);
        assert!(cache.get_order("zz").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_and_clear() {
        let cache = ResolutionCache::default();
        cache.put_order("a", order());
        cache.put_order("b", order());
        cache.set_flag(Namespace::Relationship, "u1|a", true);

        assert!(cache.invalidate(Namespace::Entity, "a"));
        assert!(!cache.invalidate(Namespace::Entity, "a"));
        assert_eq!(cache.len(Namespace::Entity), 1);

        assert_eq!(cache.clear(Namespace::Entity), 1);
        assert_eq!(cache.len(Namespace::Relationship), 1);

        cache.clear_all();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_where_is_namespace_scoped() {
        let cache = ResolutionCache::default();
        cache.set_flag(Namespace::Relationship, "u1|e1", true);
        cache.set_flag(Namespace::Relationship, "u2|e1", false);
        cache.set_flag(Namespace::Relationship, "u1|e2", true);
        cache.set_flag(Namespace::Capability, "u1|e1", true);

        let removed = cache.invalidate_where(Namespace::Relationship, |key, _| key.ends_with("|e1"));
        assert_eq!(removed, 2);
        assert_eq!(cache.len(Namespace::Relationship), 1);
        assert_eq!(cache.get_flag(Namespace::Capability, "u1|e1"), Some(true));
    }

    #[test]
    fn test_invalidate_where_counts_only_its_own_removals_under_concurrent_writes() {
        let cache = ResolutionCache::default();
        for i in 0..100 {
            cache.set_flag(Namespace::Relationship, &format!("u{i}|e1"), true);
        }

        let removed = std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..1_000 {
                    cache.set_flag(Namespace::Capability, &format!("orders.f{i}"), true);
                }
            });
            cache.invalidate_where(Namespace::Relationship, |_, _| true)
        });

        assert_eq!(removed, 100);
        assert_eq!(cache.len(Namespace::Relationship), 0);
        assert_eq!(cache.len(Namespace::Capability), 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = ResolutionCache::new(
            CacheTtls::default()
                .with_entity_ttl(Duration::from_secs(10))
                .with_relationship_ttl(Duration::from_secs(60)),
        );
        cache.put_order("a", order());
        cache.set_flag(Namespace::Relationship, "u1|a", true);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(Namespace::Entity), 0);
        assert_eq!(cache.len(Namespace::Relationship), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_track_hits_and_misses() {
        let cache = ResolutionCache::default();
        cache.put_order("a", order());

        assert!(cache.get_order("a").is_some());
        assert!(cache.get_order("a").is_some());
        assert!(cache.get_order("missing").is_none());

        let stats = cache.stats();
        assert_eq!(stats.entity.hits, 2);
        assert_eq!(stats.entity.misses, 1);
        assert_eq!(stats.entity.entry_count, 1);
        assert_eq!(stats.relationship, Default::default());

        cache.clear_all();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_writers_last_write_wins() {
        let cache = Arc::new(ResolutionCache::default());
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.set_flag(Namespace::Relationship, "u1|e1", i % 2 == 0);
                cache.get_flag(Namespace::Relationship, "u1|e1")
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
        assert_eq!(cache.len(Namespace::Relationship), 1);
    }
}
