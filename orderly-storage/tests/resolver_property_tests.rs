//! Property-Based Tests for Order Resolution
//!
//! **Property 1: Idempotent resolution.** Resolving any stored order twice
//! within the entity TTL returns the same order and the second call issues
//! no gateway calls.
//!
//! **Property 2: Expiry boundary.** A cached entry is served strictly before
//! its TTL and re-fetched at or after it.
//!
//! **Property 3: Synthetic determinism.** Unmatched identifiers in degraded
//! mode always yield the same placeholder and never populate the cache.
//!
//! **Property 4: Invalidation completeness.** After `invalidate(key)`, no
//! entity entry for that order survives, whichever identifier resolved it.

use std::sync::Arc;
use std::time::Duration;

use orderly_core::ResolvedOrder;
use orderly_storage::{InMemoryGateway, Namespace, ResolutionSource, ResolveOptions};
use proptest::prelude::*;
use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

#[path = "support/fixtures.rs"]
mod fixtures;
use fixtures::*;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

/// Current-thread runtime with paused time, so TTLs can be stepped exactly.
fn test_runtime() -> Result<Runtime, TestCaseError> {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

/// Canonical order keys.
fn order_key_strategy() -> impl Strategy<Value = String> {
    any::<u128>().prop_map(|n| Uuid::from_u128(n).hyphenated().to_string())
}

/// Identifiers that can never match an order in an empty store.
fn unmatched_identifier_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Z]{3}-[0-9]{1,6}",
        "[a-f0-9]{8}",
        "[a-z]{1,12}",
        order_key_strategy(),
    ]
}

/// The forms a caller may use to refer to a stored order.
#[derive(Debug, Clone, Copy)]
enum CallerForm {
    Canonical,
    Uppercase,
    Short,
}

fn caller_form_strategy() -> impl Strategy<Value = CallerForm> {
    prop_oneof![
        Just(CallerForm::Canonical),
        Just(CallerForm::Uppercase),
        Just(CallerForm::Short),
    ]
}

fn caller_identifier(key: &str, form: CallerForm) -> String {
    match form {
        CallerForm::Canonical => key.to_string(),
        CallerForm::Uppercase => key.to_uppercase(),
        CallerForm::Short => key[..8].to_string(),
    }
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_resolution_is_idempotent_within_ttl(
        key in order_key_strategy(),
        form in caller_form_strategy(),
        wait_secs in 0u64..120,
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let gateway = Arc::new(InMemoryGateway::new());
            gateway.insert_order(&order(&key));
            let resolver = resolver(&gateway);
            let identifier = caller_identifier(&key, form);

            let first = resolver
                .resolve(&identifier, ResolveOptions::strict())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(first.order.key(), key.clone());
            let calls = gateway.call_counts();

            tokio::time::advance(Duration::from_secs(wait_secs)).await;
            let second = resolver
                .resolve(&identifier, ResolveOptions::strict())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert_eq!(second.source, ResolutionSource::Cache);
            prop_assert_eq!(&second.order, &first.order);
            prop_assert_eq!(gateway.call_counts(), calls);
            Ok(())
        })?;
    }

    #[test]
    fn prop_entity_expiry_boundary(
        key in order_key_strategy(),
        elapsed_ms in 0u64..240_000,
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let gateway = Arc::new(InMemoryGateway::new());
            gateway.insert_order(&order(&key));
            let resolver = resolver(&gateway);
            let ttl_ms = resolver.config().entity_ttl_ms;

            resolver
                .resolve(&key, ResolveOptions::strict())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            tokio::time::advance(Duration::from_millis(elapsed_ms)).await;
            let again = resolver
                .resolve(&key, ResolveOptions::strict())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            let expected = if elapsed_ms < ttl_ms {
                ResolutionSource::Cache
            } else {
                ResolutionSource::Exact
            };
            prop_assert_eq!(again.source, expected);
            Ok(())
        })?;
    }

    #[test]
    fn prop_synthetic_is_deterministic_and_uncached(
        identifier in unmatched_identifier_strategy(),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let gateway = Arc::new(InMemoryGateway::new());
            let resolver = resolver(&gateway);

            let strict = resolver.resolve(&identifier, ResolveOptions::strict()).await;
            prop_assert!(matches!(strict, Err(ref e) if e.is_not_found()));

            let first = resolver
                .resolve(&identifier, ResolveOptions::degraded())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let second = resolver
                .resolve(&identifier, ResolveOptions::degraded())
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert!(first.is_synthetic());
            prop_assert_eq!(first.order.id, second.order.id);
            prop_assert_eq!(first.order.id, ResolvedOrder::synthetic(&identifier).id);
            prop_assert_eq!(resolver.cache().len(Namespace::Entity), 0);
            Ok(())
        })?;
    }

    #[test]
    fn prop_invalidate_removes_all_entity_entries(
        key in order_key_strategy(),
        forms in proptest::collection::vec(caller_form_strategy(), 1..4),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let gateway = Arc::new(InMemoryGateway::new());
            gateway.insert_order(&order(&key));
            let resolver = resolver(&gateway);

            for form in &forms {
                resolver
                    .resolve(&caller_identifier(&key, *form), ResolveOptions::strict())
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            prop_assert!(resolver.cache().len(Namespace::Entity) >= 1);

            resolver.invalidate(&key);
            prop_assert_eq!(resolver.cache().len(Namespace::Entity), 0);
            Ok(())
        })?;
    }
}
