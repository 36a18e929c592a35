//! ORDERLY Core - Order Types
//!
//! Data types shared by the resolution layer: orders and their fixed join
//! shape, caller identifiers, gateway query descriptions, errors, and
//! configuration. No I/O beyond reading a config file.

use chrono::{DateTime, Utc};

pub mod config;
pub mod error;
pub mod identifier;
pub mod order;
pub mod query;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

pub use config::{ResolverConfig, StoreLayout, MIN_CAPABILITY_TTL_MS};
pub use error::{ConfigError, GatewayError, GatewayResult, OrderlyResult, ResolveError};
pub use identifier::{
    is_canonical_key, short_id, Identifier, IdentifierShape, CANONICAL_KEY_LEN,
    DEFAULT_SHORT_ID_LEN,
};
pub use order::{DeliveryAssignment, OrderItem, OrderStatus, Record, ResolvedOrder};
pub use query::{Filter, JoinSpec};
