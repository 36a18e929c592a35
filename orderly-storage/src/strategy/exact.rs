//! Exact-key strategy: the identifier is the order's canonical key.

use std::sync::Arc;

use async_trait::async_trait;
use orderly_core::{Identifier, StoreLayout};

use super::{ResolutionSource, ResolutionStrategy, StrategyOutcome};
use crate::gateway::BackendGateway;

pub struct ExactKeyStrategy {
    gateway: Arc<dyn BackendGateway>,
    stores: StoreLayout,
}

impl ExactKeyStrategy {
    pub fn new(gateway: Arc<dyn BackendGateway>, stores: StoreLayout) -> Self {
        Self { gateway, stores }
    }
}

#[async_trait]
impl ResolutionStrategy for ExactKeyStrategy {
    fn source(&self) -> ResolutionSource {
        ResolutionSource::Exact
    }

    fn applies_to(&self, identifier: &Identifier) -> bool {
        identifier.is_canonical()
    }

    async fn try_resolve(&self, identifier: &Identifier) -> StrategyOutcome {
        let fetched = self
            .gateway
            .fetch_by_exact_key(
                &self.stores.orders,
                &self.stores.order_key_field,
                &identifier.key_form(),
                &self.stores.order_projection,
            )
            .await;

        match fetched {
            Ok(Some(record)) => StrategyOutcome::from_record(self.source(), &self.stores.orders, record),
            Ok(None) => StrategyOutcome::miss(self.source()),
            Err(error) => StrategyOutcome::failed(self.source(), error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayOp, InMemoryGateway};
    use orderly_core::{GatewayError, ResolvedOrder, DEFAULT_SHORT_ID_LEN};
    use uuid::Uuid;

    const KEY: &str = "a1b2c3d4-0000-4000-8000-000000000001";

    fn stored_order(key: &str) -> ResolvedOrder {
        let mut order = ResolvedOrder::synthetic(key);
        order.id = Uuid::parse_str(key).unwrap();
        order.is_synthetic = false;
        order
    }

    fn strategy(gateway: &Arc<InMemoryGateway>) -> ExactKeyStrategy {
        ExactKeyStrategy::new(gateway.clone(), StoreLayout::default())
    }

    #[tokio::test]
    async fn test_exact_key_hit_is_case_insensitive() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.insert_order(&stored_order(KEY));

        let id = Identifier::parse(&KEY.to_uppercase(), DEFAULT_SHORT_ID_LEN).unwrap();
        let strategy = strategy(&gateway);
        assert!(strategy.applies_to(&id));

        let outcome = strategy.try_resolve(&id).await;
        assert_eq!(outcome.order.unwrap().key(), KEY);
        assert_eq!(outcome.source, ResolutionSource::Exact);
    }

    #[tokio::test]
    async fn test_exact_key_does_not_apply_to_short_ids() {
        let gateway = Arc::new(InMemoryGateway::new());
        let id = Identifier::parse("a1b2c3d4", DEFAULT_SHORT_ID_LEN).unwrap();
        assert!(!strategy(&gateway).applies_to(&id));
    }

    #[tokio::test]
    async fn test_exact_key_reports_gateway_failure() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway.fail(
            GatewayOp::ExactKey,
            GatewayError::Connection {
                reason: "refused".to_string(),
            },
        );
        let id = Identifier::parse(KEY, DEFAULT_SHORT_ID_LEN).unwrap();
        let outcome = strategy(&gateway).try_resolve(&id).await;
        assert!(outcome.order.is_none());
        assert!(outcome.error.is_some());
    }
}
