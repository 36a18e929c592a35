//! Shortened-prefix strategy: the identifier is the first few characters of
//! a canonical key, as printed on receipts and delivery slips.

use std::sync::Arc;

use async_trait::async_trait;
use orderly_core::{GatewayResult, Identifier, Record, ResolverConfig, StoreLayout};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ResolutionSource, ResolutionStrategy, StrategyOutcome};
use crate::gateway::BackendGateway;

/// Candidates fetched per prefix lookup. Enough to detect and report
/// ambiguity without pulling every collision.
pub const MAX_PREFIX_CANDIDATES: usize = 10;

pub struct PrefixStrategy {
    gateway: Arc<dyn BackendGateway>,
    stores: StoreLayout,
    scan_limit: usize,
}

impl PrefixStrategy {
    pub fn new(gateway: Arc<dyn BackendGateway>, config: &ResolverConfig) -> Self {
        Self {
            gateway,
            stores: config.stores.clone(),
            scan_limit: config.prefix_scan_limit,
        }
    }
}

#[async_trait]
impl ResolutionStrategy for PrefixStrategy {
    fn source(&self) -> ResolutionSource {
        ResolutionSource::Prefix
    }

    fn applies_to(&self, identifier: &Identifier) -> bool {
        identifier.is_short()
    }

    async fn try_resolve(&self, identifier: &Identifier) -> StrategyOutcome {
        let prefix = identifier.key_form();
        let candidates = match prefix_candidates(
            self.gateway.as_ref(),
            &self.stores,
            &prefix,
            MAX_PREFIX_CANDIDATES,
            self.scan_limit,
        )
        .await
        {
            Ok(candidates) => candidates,
            Err(error) => return StrategyOutcome::failed(self.source(), error),
        };

        let count = candidates.len();
        let Some(first) = candidates.into_iter().next() else {
            return StrategyOutcome::miss(self.source());
        };

        let mut outcome = StrategyOutcome::from_record(self.source(), &self.stores.orders, first);
        if count > 1 {
            warn!(
                identifier = %identifier,
                candidates = count,
                chosen = %outcome.order.as_ref().map(|o| o.key()).unwrap_or_default(),
                "Ambiguous order prefix; using first candidate by canonical id"
            );
            outcome.ambiguous_candidates = count;
        }
        outcome
    }
}

/// Orders whose key starts with `prefix`, sorted by key.
///
/// Uses the gateway's prefix query when available and otherwise a bounded
/// scan filtered here. Scan results beyond `scan_limit` rows are never seen,
/// so the fallback can miss matches in large stores.
pub(crate) async fn prefix_candidates(
    gateway: &dyn BackendGateway,
    stores: &StoreLayout,
    prefix: &str,
    limit: usize,
    scan_limit: usize,
) -> GatewayResult<Vec<Record>> {
    let field = stores.order_key_field.as_str();
    let mut candidates = match gateway
        .fetch_by_prefix(&stores.orders, field, prefix, &stores.order_projection, limit)
        .await
    {
        Ok(records) => records,
        Err(error) if error.is_unsupported() => {
            debug!(prefix, scan_limit, "Prefix queries unsupported; scanning");
            gateway
                .scan(&stores.orders, &stores.order_projection, scan_limit)
                .await?
                .into_iter()
                .filter(|record| {
                    key_of(record, field)
                        .map(|key| key.to_ascii_lowercase().starts_with(prefix))
                        .unwrap_or(false)
                })
                .collect()
        }
        Err(error) => return Err(error),
    };

    candidates.sort_by(|a, b| key_of(a, field).cmp(&key_of(b, field)));
    candidates.truncate(limit);
    Ok(candidates)
}

fn key_of<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}
