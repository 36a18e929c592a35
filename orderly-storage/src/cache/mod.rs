//! Resolution cache with per-namespace TTLs.
//!
//! The cache is advisory: a miss or a bypass changes the cost of a lookup,
//! never its result. It is an explicitly constructed object, shared through
//! an `Arc` by the resolver, the capability probe and the relationship
//! checker, so tests can build isolated instances.
//!
//! # Namespaces
//!
//! | Namespace      | Key                | Value          | Default TTL |
//! |----------------|--------------------|----------------|-------------|
//! | `Entity`       | caller identifier  | resolved order | 2 minutes   |
//! | `Relationship` | `len:actor\|order` | bool           | 2 minutes   |
//! | `Capability`   | `store.field`      | bool           | 1 hour      |
//!
//! # Example
//!
//! ```ignore
//! let cache = ResolutionCache::new(CacheTtls::default());
//! cache.set_flag(Namespace::Relationship, "u1|e1", false);
//! assert_eq!(cache.get_flag(Namespace::Relationship, "u1|e1"), Some(false));
//! ```

pub mod namespace;
pub mod stats;
pub mod store;

pub use namespace::{
    CacheTtls, Namespace, DEFAULT_CAPABILITY_TTL, DEFAULT_ENTITY_TTL, DEFAULT_RELATIONSHIP_TTL,
};
pub use stats::{CacheStats, NamespaceStats};
pub use store::{CacheValue, ResolutionCache};
