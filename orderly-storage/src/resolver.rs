//! Order resolver: the entry point callers use.
//!
//! Resolution order is cache, then the strategy chain, then (only when the
//! caller opts in) a synthetic placeholder. The cache is written only after
//! a complete successful lookup, so dropping a `resolve` future part-way
//! leaves no trace in it.

use std::sync::Arc;

use orderly_core::{
    short_id, ConfigError, Identifier, OrderlyResult, ResolveError, ResolvedOrder, ResolverConfig,
};
use tracing::{debug, warn};

use crate::cache::{CacheStats, CacheTtls, Namespace, ResolutionCache};
use crate::gateway::BackendGateway;
use crate::probe::CapabilityProbe;
use crate::relationship::RelationshipChecker;
use crate::strategy::{ResolutionSource, StrategyChain};

// ============================================================================
// OPTIONS AND RESULTS
// ============================================================================

/// Per-call resolution options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Return a synthetic placeholder instead of an error when nothing
    /// matches. Off by default.
    pub allow_synthetic: bool,
    /// Skip the cache read. A successful result is still stored.
    pub bypass_cache: bool,
}

impl ResolveOptions {
    /// Errors on no match. The default.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Falls back to a synthetic placeholder on no match.
    pub fn degraded() -> Self {
        Self {
            allow_synthetic: true,
            ..Self::default()
        }
    }

    pub fn bypassing_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }
}

/// A resolved order and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub order: Arc<ResolvedOrder>,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn is_synthetic(&self) -> bool {
        self.order.is_synthetic
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves caller identifiers to orders through a shared cache.
pub struct OrderResolver {
    config: ResolverConfig,
    cache: Arc<ResolutionCache>,
    chain: StrategyChain,
    checker: RelationshipChecker,
}

impl OrderResolver {
    /// Build a resolver with its own cache and the standard strategy chain.
    pub fn new(gateway: Arc<dyn BackendGateway>, config: ResolverConfig) -> Result<Self, ConfigError> {
        let cache = Arc::new(ResolutionCache::new(CacheTtls::from_config(&config)));
        Self::with_cache(gateway, config, cache)
    }

    /// Build a resolver on an existing cache.
    pub fn with_cache(
        gateway: Arc<dyn BackendGateway>,
        config: ResolverConfig,
        cache: Arc<ResolutionCache>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let probe = Arc::new(CapabilityProbe::new(gateway.clone(), cache.clone()));
        let chain = StrategyChain::standard(gateway.clone(), probe, &config);
        let checker = RelationshipChecker::new(gateway, cache.clone(), config.clone());
        Ok(Self {
            config,
            cache,
            chain,
            checker,
        })
    }

    /// Replace the strategy chain.
    pub fn with_chain(mut self, chain: StrategyChain) -> Self {
        self.chain = chain;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    pub fn chain(&self) -> &StrategyChain {
        &self.chain
    }

    /// Resolve a caller-supplied identifier to an order.
    pub async fn resolve(&self, identifier: &str, options: ResolveOptions) -> OrderlyResult<Resolution> {
        let identifier = Identifier::parse(identifier, self.config.short_id_len)?;
        let cache_key = identifier.as_str();

        if !options.bypass_cache {
            if let Some(order) = self.cache.get_order(cache_key) {
                debug!(identifier = %identifier, "Resolution cache hit");
                return Ok(Resolution {
                    order,
                    source: ResolutionSource::Cache,
                });
            }
        }

        let mut report = self.chain.run(&identifier).await;

        if let Some(outcome) = report.resolved.take() {
            if let Some(order) = outcome.order {
                let order = Arc::new(order);
                self.cache.put_order(cache_key, order.clone());
                let canonical = order.key();
                if canonical != cache_key {
                    self.cache.put_order(&canonical, order.clone());
                }
                debug!(
                    identifier = %identifier,
                    source = %outcome.source,
                    order_id = %canonical,
                    "Resolved order"
                );
                return Ok(Resolution {
                    order,
                    source: outcome.source,
                });
            }
        }

        if options.allow_synthetic {
            warn!(
                identifier = %identifier,
                shape = ?identifier.shape(),
                failed_strategies = report.failures.len(),
                "No order matched; returning synthetic placeholder"
            );
            return Ok(Resolution {
                order: Arc::new(ResolvedOrder::synthetic(identifier.as_str())),
                source: ResolutionSource::Synthetic,
            });
        }

        if report.all_attempts_failed() {
            if let Some(source) = report.last_failure().cloned() {
                return Err(ResolveError::Gateway {
                    identifier: identifier.to_string(),
                    failed_strategies: report.failures.len(),
                    source,
                });
            }
        }

        debug!(
            identifier = %identifier,
            attempted = report.attempted.len(),
            "No order matched"
        );
        Err(ResolveError::NotFound {
            identifier: identifier.to_string(),
        })
    }

    /// Whether `actor_id` is assigned to `order_id`.
    pub async fn is_associated(&self, actor_id: &str, order_id: &str) -> bool {
        self.checker.is_associated(actor_id, order_id).await
    }

    /// Drop every cached fact about one order.
    ///
    /// Removes entity entries keyed by the order id or its short id, entity
    /// entries holding that order under any other identifier, and
    /// relationship entries for either form of the id. Returns the number of
    /// removed entries.
    pub fn invalidate(&self, order_id: &str) -> u64 {
        let order_key = order_id.trim().to_ascii_lowercase();
        let short = short_id(&order_key, self.config.short_id_len);
        let matches_id = |candidate: &str| {
            candidate.eq_ignore_ascii_case(&order_key) || candidate.eq_ignore_ascii_case(&short)
        };

        let entities = self.cache.invalidate_where(Namespace::Entity, |key, value| {
            matches_id(key)
                || value
                    .as_order()
                    .map(|order| order.key() == order_key)
                    .unwrap_or(false)
        });
        let relationships = self.cache.invalidate_where(Namespace::Relationship, |key, _| {
            RelationshipChecker::order_part(key)
                .map(|order| matches_id(order))
                .unwrap_or(false)
        });

        debug!(order_id = %order_key, entities, relationships, "Invalidated order");
        entities + relationships
    }

    /// Drop every cached entry in every namespace.
    pub fn clear_all(&self) {
        self.cache.clear_all();
        debug!("Resolution cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
