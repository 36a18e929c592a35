//! Secondary-key strategy: the identifier is an external reference number.
//!
//! The reference column is optional in deployed schemas, so the lookup only
//! runs once the capability probe has confirmed the column exists.

use std::sync::Arc;

use async_trait::async_trait;
use orderly_core::{Identifier, StoreLayout};

use super::{ResolutionSource, ResolutionStrategy, StrategyOutcome};
use crate::gateway::BackendGateway;
use crate::probe::CapabilityProbe;

pub struct SecondaryKeyStrategy {
    gateway: Arc<dyn BackendGateway>,
    probe: Arc<CapabilityProbe>,
    stores: StoreLayout,
}

impl SecondaryKeyStrategy {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        probe: Arc<CapabilityProbe>,
        stores: StoreLayout,
    ) -> Self {
        Self {
            gateway,
            probe,
            stores,
        }
    }
}

#[async_trait]
impl ResolutionStrategy for SecondaryKeyStrategy {
    fn source(&self) -> ResolutionSource {
        ResolutionSource::SecondaryKey
    }

    fn applies_to(&self, _identifier: &Identifier) -> bool {
        true
    }

    async fn try_resolve(&self, identifier: &Identifier) -> StrategyOutcome {
        if !self
            .probe
            .has_field(&self.stores.orders, &self.stores.reference_field)
            .await
        {
            return StrategyOutcome::skipped(self.source());
        }

        match self
            .gateway
            .fetch_by_exact_key(
                &self.stores.orders,
                &self.stores.reference_field,
                identifier.as_str(),
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
