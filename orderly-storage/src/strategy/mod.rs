//! Resolution strategies and the chain that runs them.
//!
//! Each strategy is one self-contained heuristic for turning an identifier
//! into an order. The chain tries them in a fixed order (cheapest and most
//! selective first) and stops at the first hit. A strategy error is logged
//! and treated as "no match"; it never aborts the chain.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use orderly_core::{GatewayError, Identifier, Record, ResolvedOrder, ResolverConfig};
use tracing::{debug, warn};

use crate::gateway::BackendGateway;
use crate::probe::CapabilityProbe;

pub mod exact;
pub mod indirect;
pub mod prefix;
pub mod secondary;

pub use exact::ExactKeyStrategy;
pub use indirect::IndirectReferenceStrategy;
pub use prefix::PrefixStrategy;
pub use secondary::SecondaryKeyStrategy;

/// Where a resolution result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionSource {
    Cache,
    Exact,
    Prefix,
    Indirect,
    SecondaryKey,
    Synthetic,
    NotFound,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionSource::Cache => "cache",
            ResolutionSource::Exact => "exact",
            ResolutionSource::Prefix => "prefix",
            ResolutionSource::Indirect => "indirect",
            ResolutionSource::SecondaryKey => "secondary-key",
            ResolutionSource::Synthetic => "synthetic",
            ResolutionSource::NotFound => "not-found",
        }
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one strategy attempt.
///
/// Every strategy returns this shape so the chain can log provenance
/// without branching on strategy type.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome {
    pub order: Option<ResolvedOrder>,
    pub source: ResolutionSource,
    pub error: Option<GatewayError>,
    /// The strategy did not apply and issued no lookup.
    pub skipped: bool,
    /// Number of candidates seen when more than one matched.
    pub ambiguous_candidates: usize,
}

impl StrategyOutcome {
    pub fn found(source: ResolutionSource, order: ResolvedOrder) -> Self {
        Self {
            order: Some(order),
            source,
            error: None,
            skipped: false,
            ambiguous_candidates: 0,
        }
    }

    pub fn miss(source: ResolutionSource) -> Self {
        Self {
            order: None,
            source,
            error: None,
            skipped: false,
            ambiguous_candidates: 0,
        }
    }

    pub fn skipped(source: ResolutionSource) -> Self {
        Self {
            skipped: true,
            ..Self::miss(source)
        }
    }

    pub fn failed(source: ResolutionSource, error: GatewayError) -> Self {
        Self {
            error: Some(error),
            ..Self::miss(source)
        }
    }

    /// Decode a fetched record, turning decode failures into a failed outcome.
    pub fn from_record(source: ResolutionSource, store: &str, record: Record) -> Self {
        match ResolvedOrder::from_record(store, record) {
            Ok(order) => Self::found(source, order),
            Err(error) => Self::failed(source, error),
        }
    }

    pub fn is_hit(&self) -> bool {
        self.order.is_some()
    }
}

/// One heuristic for resolving an identifier to an order.
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    /// Source reported when this strategy wins.
    fn source(&self) -> ResolutionSource;

    /// Cheap, synchronous applicability check on the identifier's shape.
    fn applies_to(&self, identifier: &Identifier) -> bool;

    /// Attempt the lookup. Errors are reported on the outcome, never raised.
    async fn try_resolve(&self, identifier: &Identifier) -> StrategyOutcome;
}

/// Summary of one chain run.
#[derive(Debug, Clone, Default)]
pub struct ChainReport {
    /// The winning outcome, if any strategy hit.
    pub resolved: Option<StrategyOutcome>,
    /// Strategies that applied and issued lookups.
    pub attempted: Vec<ResolutionSource>,
    /// Strategies whose lookup failed, with the failure.
    pub failures: Vec<(ResolutionSource, GatewayError)>,
}

impl ChainReport {
    /// True when lookups ran and every one of them failed, so absence was
    /// never actually established.
    pub fn all_attempts_failed(&self) -> bool {
        self.resolved.is_none()
            && !self.attempted.is_empty()
            && self.failures.len() == self.attempted.len()
    }

    pub fn last_failure(&self) -> Option<&GatewayError> {
        self.failures.last().map(|(_, error)| error)
    }
}

/// Ordered list of strategies, short-circuiting on the first hit.
#[derive(Default)]
pub struct StrategyChain {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl StrategyChain {
    /// An empty chain. Resolves nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard order: exact key, shortened prefix, indirect reference,
    /// secondary key.
    pub fn standard(
        gateway: Arc<dyn BackendGateway>,
        probe: Arc<CapabilityProbe>,
        config: &ResolverConfig,
    ) -> Self {
        Self::new()
            .with_strategy(ExactKeyStrategy::new(gateway.clone(), config.stores.clone()))
            .with_strategy(PrefixStrategy::new(gateway.clone(), config))
            .with_strategy(IndirectReferenceStrategy::new(
                gateway.clone(),
                config.stores.clone(),
            ))
            .with_strategy(SecondaryKeyStrategy::new(
                gateway,
                probe,
                config.stores.clone(),
            ))
    }

    /// Append a strategy to the end of the chain.
    pub fn with_strategy<S>(mut self, strategy: S) -> Self
    where
        S: ResolutionStrategy + 'static,
    {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Sources of the strategies, in chain order.
    pub fn sources(&self) -> Vec<ResolutionSource> {
        self.strategies.iter().map(|s| s.source()).collect()
    }

    /// Run the strategies in order until one hits.
    pub async fn run(&self, identifier: &Identifier) -> ChainReport {
        let mut report = ChainReport::default();

        for strategy in &self.strategies {
            let source = strategy.source();
            if !strategy.applies_to(identifier) {
                debug!(identifier = %identifier, strategy = %source, "Strategy does not apply");
                continue;
            }

            let outcome = strategy.try_resolve(identifier).await;
            if outcome.skipped {
                debug!(identifier = %identifier, strategy = %source, "Strategy skipped");
                continue;
            }
            report.attempted.push(source);

            if let Some(error) = &outcome.error {
                warn!(
                    identifier = %identifier,
                    strategy = %source,
                    error = %error,
                    "Strategy failed; continuing with next strategy"
                );
                report.failures.push((source, error.clone()));
                continue;
            }

            if outcome.is_hit() {
                debug!(identifier = %identifier, strategy = %source, "Strategy resolved identifier");
                report.resolved = Some(outcome);
                return report;
            }

            debug!(identifier = %identifier, strategy = %source, "Strategy found no match");
        }

        report
    }
}
