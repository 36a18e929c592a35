//! Shared fixtures for resolver integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use orderly_core::{DeliveryAssignment, OrderStatus, Record, ResolvedOrder, ResolverConfig};
use orderly_storage::{InMemoryGateway, OrderResolver};
use serde_json::Value;
use uuid::Uuid;

pub const ORDER_KEY: &str = "a1b2c3d4-0000-4000-8000-000000000001";
pub const SIBLING_KEY: &str = "a1b2c3d4-9999-4000-8000-000000000002";
pub const OTHER_KEY: &str = "ffff0000-0000-4000-8000-000000000003";

/// A stored (non-synthetic) order with no assignments.
pub fn order(key: &str) -> ResolvedOrder {
    ResolvedOrder {
        id: Uuid::parse_str(key).expect("fixture key is a uuid"),
        reference_number: None,
        retailer_id: Some(Uuid::new_v4()),
        wholesaler_id: Some(Uuid::new_v4()),
        status: OrderStatus::Confirmed,
        total_amount: 120.5,
        created_at: None,
        items: Vec::new(),
        assignments: Vec::new(),
        is_synthetic: false,
    }
}

pub fn order_with_reference(key: &str, reference: &str) -> ResolvedOrder {
    ResolvedOrder {
        reference_number: Some(reference.to_string()),
        ..order(key)
    }
}

pub fn order_with_partner(key: &str, partner: Uuid) -> ResolvedOrder {
    let mut order = order(key);
    order.assignments.push(DeliveryAssignment {
        id: Uuid::new_v4(),
        order_id: order.id,
        delivery_partner_id: partner,
        status: Some("assigned".to_string()),
        assigned_at: None,
    });
    order
}

/// Build a raw record from `(field, value)` pairs.
pub fn record(fields: &[(&str, &str)]) -> Record {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

pub fn resolver(gateway: &Arc<InMemoryGateway>) -> OrderResolver {
    resolver_with(gateway, ResolverConfig::default())
}

pub fn resolver_with(gateway: &Arc<InMemoryGateway>, config: ResolverConfig) -> OrderResolver {
    OrderResolver::new(gateway.clone(), config).expect("fixture config is valid")
}
