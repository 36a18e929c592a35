//! Cache namespaces and their time-to-live policy.
//!
//! One keyed store backs three independent concerns. Each concern gets its
//! own namespace so keys never collide and each can carry its own TTL.

use orderly_core::ResolverConfig;
use std::fmt;
use std::time::Duration;

/// Default TTL for resolved orders.
pub const DEFAULT_ENTITY_TTL: Duration = Duration::from_secs(2 * 60);

/// Default TTL for actor/order association answers.
pub const DEFAULT_RELATIONSHIP_TTL: Duration = Duration::from_secs(2 * 60);

/// Default (and minimum) TTL for schema capability answers.
pub const DEFAULT_CAPABILITY_TTL: Duration = Duration::from_secs(60 * 60);

/// Logical partition of the resolution cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Resolved orders keyed by the identifier they were resolved from.
    Entity,
    /// Boolean association checks keyed by `(actor, order)`.
    Relationship,
    /// Boolean schema capabilities keyed by `store.field`.
    Capability,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [
        Namespace::Entity,
        Namespace::Relationship,
        Namespace::Capability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Entity => "entity",
            Namespace::Relationship => "relationship",
            Namespace::Capability => "capability",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Namespace::Entity => 0,
            Namespace::Relationship => 1,
            Namespace::Capability => 2,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-namespace TTLs.
///
/// An entry whose age reaches its TTL is treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub entity: Duration,
    pub relationship: Duration,
    pub capability: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            entity: DEFAULT_ENTITY_TTL,
            relationship: DEFAULT_RELATIONSHIP_TTL,
            capability: DEFAULT_CAPABILITY_TTL,
        }
    }
}

impl CacheTtls {
    /// TTLs taken from a validated resolver config.
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            entity: config.entity_ttl(),
            relationship: config.relationship_ttl(),
            capability: config.capability_ttl(),
        }
    }

    /// Set the entity TTL.
    pub fn with_entity_ttl(mut self, ttl: Duration) -> Self {
        self.entity = ttl;
        self
    }

    /// Set the relationship TTL.
    pub fn with_relationship_ttl(mut self, ttl: Duration) -> Self {
        self.relationship = ttl;
        self
    }

    /// Set the capability TTL.
    pub fn with_capability_ttl(mut self, ttl: Duration) -> Self {
        self.capability = ttl;
        self
    }

    pub fn for_namespace(&self, namespace: Namespace) -> Duration {
        match namespace {
            Namespace::Entity => self.entity,
            Namespace::Relationship => self.relationship,
            Namespace::Capability => self.capability,
        }
    }
}
