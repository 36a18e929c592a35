//! Cache usage statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use super::namespace::Namespace;

/// Statistics for one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceStats {
    /// Reads served from a live entry.
    pub hits: u64,
    /// Reads that found nothing or only an expired entry.
    pub misses: u64,
    /// Entries currently stored, expired ones included.
    pub entry_count: u64,
}

impl NamespaceStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Snapshot of cache usage across all namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entity: NamespaceStats,
    pub relationship: NamespaceStats,
    pub capability: NamespaceStats,
}

impl CacheStats {
    pub fn namespace(&self, namespace: Namespace) -> &NamespaceStats {
        match namespace {
            Namespace::Entity => &self.entity,
            Namespace::Relationship => &self.relationship,
            Namespace::Capability => &self.capability,
        }
    }

    pub(crate) fn namespace_mut(&mut self, namespace: Namespace) -> &mut NamespaceStats {
        match namespace {
            Namespace::Entity => &mut self.entity,
            Namespace::Relationship => &mut self.relationship,
            Namespace::Capability => &mut self.capability,
        }
    }

    /// Hit rate over every namespace combined.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.entity.hits + self.relationship.hits + self.capability.hits;
        let misses = self.entity.misses + self.relationship.misses + self.capability.misses;
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Lock-free hit/miss counters for one namespace.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn load(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    pub(crate) fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
