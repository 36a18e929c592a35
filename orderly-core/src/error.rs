//! Error types for ORDERLY operations

use thiserror::Error;

/// Backend gateway errors.
///
/// Every variant is local to a single gateway call. The strategy chain
/// recovers from these and moves on to the next strategy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Gateway call on {store} timed out after {elapsed_ms}ms")]
    Timeout { store: String, elapsed_ms: u64 },

    #[error("Connection to backend failed: {reason}")]
    Connection { reason: String },

    #[error("Query on {store} failed: {reason}")]
    Query { store: String, reason: String },

    #[error("Gateway does not support {operation}")]
    Unsupported { operation: &'static str },

    #[error("Failed to decode {store} record: {reason}")]
    Decode { store: String, reason: String },
}

impl GatewayError {
    /// Whether the failure is expected to clear up on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connection { .. } | Self::Query { .. })
    }

    /// Whether the gateway lacks the requested operation entirely.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Errors surfaced to callers of the resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Order not found for identifier {identifier}")]
    NotFound { identifier: String },

    #[error("Invalid identifier: {reason}")]
    InvalidIdentifier { reason: String },

    /// Every strategy that ran failed with a gateway error, so absence
    /// could not be established.
    #[error("Backend unavailable while resolving {identifier} ({failed_strategies} strategies failed): {source}")]
    Gateway {
        identifier: String,
        failed_strategies: usize,
        source: GatewayError,
    },
}

impl ResolveError {
    /// True for the "record does not exist" case, as opposed to a backend outage.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when the backend was unreachable for the whole resolution.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Gateway { .. })
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Result type alias for resolver operations.
pub type OrderlyResult<T> = Result<T, ResolveError>;

/// Result type alias for a single gateway call.
pub type GatewayResult<T> = Result<T, GatewayError>;

// =============================================================================
// TESTS
// =============================================================================
