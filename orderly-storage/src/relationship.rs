//! Actor-to-order association checks.
//!
//! Answers "is this delivery partner assigned to this order?" with one
//! joined query, memoizing both answers in the relationship namespace.

use std::sync::Arc;

use orderly_core::{Filter, GatewayResult, JoinSpec, ResolverConfig};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{Namespace, ResolutionCache};
use crate::gateway::BackendGateway;
use crate::strategy::prefix::prefix_candidates;

/// Memoizing association check between actors and orders.
pub struct RelationshipChecker {
    gateway: Arc<dyn BackendGateway>,
    cache: Arc<ResolutionCache>,
    config: ResolverConfig,
}

impl RelationshipChecker {
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        cache: Arc<ResolutionCache>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            gateway,
            cache,
            config,
        }
    }

    /// Cache key for an `(actor, order)` pair: `<actor byte len>:<actor>|<order>`.
    ///
    /// The length prefix keeps the encoding unambiguous when either id
    /// contains `|`.
    pub fn relationship_key(actor_id: &str, order_id: &str) -> String {
        format!(
            "{}:{}|{}",
            actor_id.len(),
            actor_id,
            order_id.to_ascii_lowercase()
        )
    }

    /// Order part of a key built by [`Self::relationship_key`].
    pub(crate) fn order_part(key: &str) -> Option<&str> {
        let (len, rest) = key.split_once(':')?;
        let len: usize = len.parse().ok()?;
        rest.get(len..)?.strip_prefix('|')
    }

    /// Whether `actor_id` is assigned to the order identified by `order_id`.
    ///
    /// `order_id` may be a full key or a shortened id. Gateway failures
    /// answer `false` for this call only and leave the cache untouched.
    pub async fn is_associated(&self, actor_id: &str, order_id: &str) -> bool {
        let actor_id = actor_id.trim();
        let order_id = order_id.trim();
        let key = Self::relationship_key(actor_id, order_id);
        if let Some(associated) = self.cache.get_flag(Namespace::Relationship, &key) {
            debug!(actor_id, order_id, associated, "Relationship cache hit");
            return associated;
        }

        match self.lookup(actor_id, order_id).await {
            Ok(associated) => {
                self.cache.set_flag(Namespace::Relationship, &key, associated);
                debug!(actor_id, order_id, associated, "Relationship checked");
                associated
            }
            Err(error) => {
                warn!(
                    actor_id,
                    order_id,
                    error = %error,
                    "Relationship check failed; answering false without caching"
                );
                false
            }
        }
    }

    async fn lookup(&self, actor_id: &str, order_id: &str) -> GatewayResult<bool> {
        let order_key = order_id.to_ascii_lowercase();
        if self.joined_match(actor_id, &order_key).await? {
            return Ok(true);
        }

        if order_id.chars().count() != self.config.short_id_len {
            return Ok(false);
        }

        let stores = &self.config.stores;
        let candidates = prefix_candidates(
            self.gateway.as_ref(),
            stores,
            &order_key,
            self.config.relationship_candidate_limit,
            self.config.prefix_scan_limit,
        )
        .await?;

        for candidate in candidates {
            let Some(Value::String(candidate_key)) = candidate.get(&stores.order_key_field) else {
                continue;
            };
            if candidate_key.eq_ignore_ascii_case(&order_key) {
                continue;
            }
            if self.joined_match(actor_id, candidate_key).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn joined_match(&self, actor_id: &str, order_key: &str) -> GatewayResult<bool> {
        let stores = &self.config.stores;
        let join = JoinSpec::inner(
            stores.assignments.clone(),
            stores.assignment_order_field.clone(),
            stores.order_projection.clone(),
        );
        let filters = [
            Filter::eq(stores.order_key_field.clone(), order_key),
            Filter::eq(
                format!("{}.{}", stores.assignments, stores.assignment_actor_field),
                actor_id,
            ),
        ];
        Ok(self
            .gateway
            .fetch_joined(&stores.orders, &join, &filters)
            .await?
            .is_some())
    }
}
