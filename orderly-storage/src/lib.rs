//! ORDERLY Storage - Resolution Cache and Order Resolver
//!
//! Turns ambiguous caller identifiers (full keys, shortened ids, notification
//! ids, external reference numbers) into orders, memoizing lookups,
//! relationship checks and schema probes in one shared TTL cache.
//!
//! The backend store is reached only through [`BackendGateway`]; an
//! [`InMemoryGateway`] is provided for tests and local development.

pub mod cache;
pub mod gateway;
pub mod probe;
pub mod relationship;
pub mod resolver;
pub mod strategy;

pub use cache::{
    CacheStats, CacheTtls, CacheValue, Namespace, NamespaceStats, ResolutionCache,
    DEFAULT_CAPABILITY_TTL, DEFAULT_ENTITY_TTL, DEFAULT_RELATIONSHIP_TTL,
};
pub use gateway::{BackendGateway, GatewayCall, GatewayCallCounts, GatewayOp, InMemoryGateway};
pub use probe::CapabilityProbe;
pub use relationship::RelationshipChecker;
pub use resolver::{OrderResolver, Resolution, ResolveOptions};
pub use strategy::{
    ChainReport, ExactKeyStrategy, IndirectReferenceStrategy, PrefixStrategy, ResolutionSource,
    ResolutionStrategy, SecondaryKeyStrategy, StrategyChain, StrategyOutcome,
};
