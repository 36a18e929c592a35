//! Indirect-reference strategy: the identifier is the id of a notification
//! that points at an order.

use std::sync::Arc;

use async_trait::async_trait;
use orderly_core::{is_canonical_key, Identifier, StoreLayout};
use serde_json::Value;
use tracing::debug;

use super::{ResolutionSource, ResolutionStrategy, StrategyOutcome};
use crate::gateway::BackendGateway;

pub struct IndirectReferenceStrategy {
    gateway: Arc<dyn BackendGateway>,
    stores: StoreLayout,
}

impl IndirectReferenceStrategy {
    pub fn new(gateway: Arc<dyn BackendGateway>, stores: StoreLayout) -> Self {
        Self { gateway, stores }
    }
}

#[async_trait]
impl ResolutionStrategy for IndirectReferenceStrategy {
    fn source(&self) -> ResolutionSource {
        ResolutionSource::Indirect
    }

    fn applies_to(&self, identifier: &Identifier) -> bool {
        identifier.is_canonical()
    }

    async fn try_resolve(&self, identifier: &Identifier) -> StrategyOutcome {
        let notification = match self
            .gateway
            .fetch_related(&self.stores.notifications, &identifier.key_form())
            .await
        {
            Ok(Some(record)) => record,
            Ok(None) => return StrategyOutcome::miss(self.source()),
            Err(error) => return StrategyOutcome::failed(self.source(), error),
        };

        let order_key = match notification.get(&self.stores.notification_order_field) {
            Some(Value::String(key)) if is_canonical_key(key) => key.to_ascii_lowercase(),
            _ => {
                debug!(
                    identifier = %identifier,
                    "Notification carries no usable order reference"
                );
                return StrategyOutcome::miss(self.source());
            }
        };

        match self
            .gateway
            .fetch_by_exact_key(
                &self.stores.orders,
                &self.stores.order_key_field,
                &order_key,
                &self.stores.order_projection,
            )
            .await
        {
            Ok(Some(record)) => StrategyOutcome::from_record(self.source(), &self.stores.orders, record),
            Ok(None) => StrategyOutcome::miss(self.source()),
            Err(error) => StrategyOutcome::failed(self.source(), error),
        }
    }
}
