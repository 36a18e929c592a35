//! Resolver configuration
//!
//! Loaded from TOML. Every field has a default so a partial file is valid;
//! `validate()` must pass before the values are used.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::identifier::{CANONICAL_KEY_LEN, DEFAULT_SHORT_ID_LEN};

/// Shortest capability TTL accepted. Capability answers live for the process.
pub const MIN_CAPABILITY_TTL_MS: u64 = 60 * 60 * 1000;

/// Upper bound on prefix candidates checked by the relationship checker.
pub const MAX_RELATIONSHIP_CANDIDATES: usize = 50;

/// Names of the stores and fields the resolver touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoreLayout {
    pub orders: String,
    pub order_key_field: String,
    /// Projection producing the fixed join shape of a resolved order.
    pub order_projection: String,
    /// Optional secondary key column on the orders store.
    pub reference_field: String,
    pub notifications: String,
    /// Key column of the notifications store.
    pub notification_key_field: String,
    /// Column on a notification holding the order it points at.
    pub notification_order_field: String,
    pub assignments: String,
    pub assignment_order_field: String,
    pub assignment_actor_field: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            orders: "orders".to_string(),
            order_key_field: "id".to_string(),
            order_projection: "*, order_items(*), delivery_assignments(*)".to_string(),
            reference_field: "reference_number".to_string(),
            notifications: "notifications".to_string(),
            notification_key_field: "id".to_string(),
            notification_order_field: "order_id".to_string(),
            assignments: "delivery_assignments".to_string(),
            assignment_order_field: "order_id".to_string(),
            assignment_actor_field: "delivery_partner_id".to_string(),
        }
    }
}

/// Master configuration for the resolution layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ResolverConfig {
    pub entity_ttl_ms: u64,
    pub relationship_ttl_ms: u64,
    pub capability_ttl_ms: u64,
    pub short_id_len: usize,
    /// Row cap for the client-side prefix scan fallback.
    pub prefix_scan_limit: usize,
    /// Prefix candidates the relationship checker inspects before giving up.
    pub relationship_candidate_limit: usize,
    pub stores: StoreLayout,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            entity_ttl_ms: 2 * 60 * 1000,
            relationship_ttl_ms: 2 * 60 * 1000,
            capability_ttl_ms: MIN_CAPABILITY_TTL_MS,
            short_id_len: DEFAULT_SHORT_ID_LEN,
            prefix_scan_limit: 500,
            relationship_candidate_limit: 5,
            stores: StoreLayout::default(),
        }
    }
}

impl ResolverConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn entity_ttl(&self) -> Duration {
        Duration::from_millis(self.entity_ttl_ms)
    }

    pub fn relationship_ttl(&self) -> Duration {
        Duration::from_millis(self.relationship_ttl_ms)
    }

    pub fn capability_ttl(&self) -> Duration {
        Duration::from_millis(self.capability_ttl_ms)
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - entity and relationship TTLs are positive
    /// - capability TTL is at least one hour
    /// - short_id_len is within 1..=36
    /// - scan and candidate limits are positive and bounded
    /// - store and field names are non-empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entity_ttl_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "entity_ttl_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.relationship_ttl_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "relationship_ttl_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.capability_ttl_ms < MIN_CAPABILITY_TTL_MS {
            return Err(ConfigError::InvalidValue {
                field: "capability_ttl_ms",
                reason: format!("must be at least {MIN_CAPABILITY_TTL_MS}"),
            });
        }
        if self.short_id_len == 0 || self.short_id_len > CANONICAL_KEY_LEN {
            return Err(ConfigError::InvalidValue {
                field: "short_id_len",
                reason: format!("must be between 1 and {CANONICAL_KEY_LEN}"),
            });
        }
        if self.prefix_scan_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "prefix_scan_limit",
                reason: "must be positive".to_string(),
            });
        }
        if self.relationship_candidate_limit == 0
            || self.relationship_candidate_limit > MAX_RELATIONSHIP_CANDIDATES
        {
            return Err(ConfigError::InvalidValue {
                field: "relationship_candidate_limit",
                reason: format!("must be between 1 and {MAX_RELATIONSHIP_CANDIDATES}"),
            });
        }

        let names = [
            ("stores.orders", &self.stores.orders),
            ("stores.order_key_field", &self.stores.order_key_field),
            ("stores.order_projection", &self.stores.order_projection),
            ("stores.reference_field", &self.stores.reference_field),
            ("stores.notifications", &self.stores.notifications),
            (
                "stores.notification_key_field",
                &self.stores.notification_key_field,
            ),
            (
                "stores.notification_order_field",
                &self.stores.notification_order_field,
            ),
            ("stores.assignments", &self.stores.assignments),
            (
                "stores.assignment_order_field",
                &self.stores.assignment_order_field,
            ),
            (
                "stores.assignment_actor_field",
                &self.stores.assignment_actor_field,
            ),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}
