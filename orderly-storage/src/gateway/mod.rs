//! Backend gateway trait for the record store.
//!
//! The store itself is an external collaborator. This trait is the narrow
//! surface the resolution layer needs from it. Every method is a suspension
//! point; cancellation and timeouts belong to the caller, who drops the
//! future (e.g. via `tokio::time::timeout`).

use async_trait::async_trait;
use orderly_core::{Filter, GatewayError, GatewayResult, JoinSpec, Record};

pub mod memory;

pub use memory::{GatewayCall, GatewayCallCounts, GatewayOp, InMemoryGateway};

/// Async gateway to the backend record store.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    // ========================================================================
    // KEYED LOOKUPS
    // ========================================================================

    /// Fetch the single record whose `field` equals `key`.
    async fn fetch_by_exact_key(
        &self,
        store: &str,
        field: &str,
        key: &str,
        projection: &str,
    ) -> GatewayResult<Option<Record>>;

    /// Fetch up to `limit` records whose `field` starts with `prefix`,
    /// in ascending order of `field`.
    ///
    /// This is the indexed `field LIKE 'prefix%'` path. Gateways that cannot
    /// run it keep the default, which reports the operation as unsupported.
    async fn fetch_by_prefix(
        &self,
        _store: &str,
        _field: &str,
        _prefix: &str,
        _projection: &str,
        _limit: usize,
    ) -> GatewayResult<Vec<Record>> {
        Err(GatewayError::Unsupported {
            operation: "fetch_by_prefix",
        })
    }

    /// Fetch up to `limit` records from `store` in unspecified order.
    ///
    /// Only used as the bounded fallback when prefix queries are unsupported.
    async fn scan(
        &self,
        _store: &str,
        _projection: &str,
        _limit: usize,
    ) -> GatewayResult<Vec<Record>> {
        Err(GatewayError::Unsupported { operation: "scan" })
    }

    /// Fetch a record from a secondary store by its key.
    async fn fetch_related(&self, secondary_store: &str, key: &str)
        -> GatewayResult<Option<Record>>;

    /// Fetch the first record of `store` joined with `join` that satisfies
    /// every filter.
    async fn fetch_joined(
        &self,
        store: &str,
        join: &JoinSpec,
        filters: &[Filter],
    ) -> GatewayResult<Option<Record>>;

    // ========================================================================
    // SCHEMA
    // ========================================================================

    /// List the column names of `store`.
    async fn introspect_columns(&self, store: &str) -> GatewayResult<Vec<String>>;
}
