//! Schema capability probe.
//!
//! Some strategies depend on optional columns. Probing the schema on every
//! call is wasteful, so answers are memoized in the capability namespace.
//! A failed probe is never memoized: the next call asks again.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{Namespace, ResolutionCache};
use crate::gateway::BackendGateway;

/// Memoizing check for optional store fields.
pub struct CapabilityProbe {
    gateway: Arc<dyn BackendGateway>,
    cache: Arc<ResolutionCache>,
}

impl CapabilityProbe {
    pub fn new(gateway: Arc<dyn BackendGateway>, cache: Arc<ResolutionCache>) -> Self {
        Self { gateway, cache }
    }

    /// Cache key for a `(store, field)` pair.
    pub fn capability_key(store: &str, field: &str) -> String {
        format!("{store}.{field}")
    }

    /// Whether `store` has a column named `field`.
    ///
    /// Introspection failures answer `false` for this call only.
    pub async fn has_field(&self, store: &str, field: &str) -> bool {
        let key = Self::capability_key(store, field);
        if let Some(present) = self.cache.get_flag(Namespace::Capability, &key) {
            return present;
        }

        match self.gateway.introspect_columns(store).await {
            Ok(columns) => {
                let present = columns.iter().any(|column| column == field);
                self.cache.set_flag(Namespace::Capability, &key, present);
                debug!(store, field, present, "Capability probed");
                present
            }
            Err(error) => {
                warn!(
                    store,
                    field,
                    error = %error,
                    "Capability probe failed; treating field as absent for this call"
                );
                false
            }
        }
    }
}
