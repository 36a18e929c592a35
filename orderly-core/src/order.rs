//! Order entity structures
//!
//! A resolved order is the order row plus a fixed join shape: its line items
//! and its delivery assignments. Records arrive from the backend as JSON
//! objects and are decoded here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::identifier::short_id;
use crate::Timestamp;

/// Raw record as returned by the backend gateway.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Namespace for deterministic synthetic order ids (UUIDv5).
pub const SYNTHETIC_NAMESPACE: Uuid = Uuid::from_u128(0x6f72_6465_726c_7900_8000_0000_0000_0001);

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Packed,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    /// Placeholder produced in degraded mode. Never stored by the backend.
    Synthetic,
    /// A status this build does not know about.
    #[serde(other)]
    Unknown,
}

/// Line item of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: i32,
    #[serde(default)]
    pub unit_price: f64,
}

/// Assignment of an order to a delivery partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAssignment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub delivery_partner_id: Uuid,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<Timestamp>,
}

/// An order together with its directly related sub-records.
///
/// Immutable while cached; the backend is always the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOrder {
    pub id: Uuid,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub retailer_id: Option<Uuid>,
    #[serde(default)]
    pub wholesaler_id: Option<Uuid>,
    pub status: OrderStatus,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default, rename = "order_items")]
    pub items: Vec<OrderItem>,
    #[serde(default, rename = "delivery_assignments")]
    pub assignments: Vec<DeliveryAssignment>,
    /// Visible marker for placeholders. Always false for backend records.
    #[serde(default)]
    pub is_synthetic: bool,
}

impl ResolvedOrder {
    /// Decode a backend record from `store`.
    pub fn from_record(store: &str, record: Record) -> Result<Self, GatewayError> {
        let order: ResolvedOrder = serde_json::from_value(serde_json::Value::Object(record))
            .map_err(|e| GatewayError::Decode {
                store: store.to_string(),
                reason: e.to_string(),
            })?;
        if order.is_synthetic {
            return Err(GatewayError::Decode {
                store: store.to_string(),
                reason: "backend record carries the synthetic marker".to_string(),
            });
        }
        Ok(order)
    }

    /// Build a placeholder order for an identifier nothing matched.
    ///
    /// Derived only from the identifier, so the same input always yields the
    /// same placeholder.
    pub fn synthetic(identifier: &str) -> Self {
        Self {
            id: Uuid::new_v5(&SYNTHETIC_NAMESPACE, identifier.as_bytes()),
            reference_number: Some(identifier.to_string()),
            retailer_id: None,
            wholesaler_id: None,
            status: OrderStatus::Synthetic,
            total_amount: 0.0,
            created_at: None,
            items: Vec::new(),
            assignments: Vec::new(),
            is_synthetic: true,
        }
    }

    /// Canonical key in hyphenated lowercase form.
    pub fn key(&self) -> String {
        self.id.hyphenated().to_string()
    }

    /// Shortened id of this order.
    pub fn short_id(&self, len: usize) -> String {
        short_id(&self.key(), len)
    }

    /// Whether `actor_id` is the delivery partner on any assignment.
    pub fn is_assigned_to(&self, actor_id: Uuid) -> bool {
        self.assignments
            .iter()
            .any(|a| a.delivery_partner_id == actor_id)
    }
}
