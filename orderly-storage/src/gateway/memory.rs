//! In-memory backend gateway for tests and local development.
//!
//! Records are plain JSON objects grouped by store name. Every call is
//! counted and logged, failures can be injected per operation, and an
//! optional per-call delay makes cancellation observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use orderly_core::{
    Filter, GatewayError, GatewayResult, JoinSpec, Record, ResolvedOrder, StoreLayout,
};
use serde_json::Value;

use super::BackendGateway;

/// Gateway operation, used for call accounting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    ExactKey,
    Prefix,
    Scan,
    Related,
    Joined,
    Introspect,
}

impl GatewayOp {
    const ALL: [GatewayOp; 6] = [
        GatewayOp::ExactKey,
        GatewayOp::Prefix,
        GatewayOp::Scan,
        GatewayOp::Related,
        GatewayOp::Joined,
        GatewayOp::Introspect,
    ];

    fn index(&self) -> usize {
        match self {
            GatewayOp::ExactKey => 0,
            GatewayOp::Prefix => 1,
            GatewayOp::Scan => 2,
            GatewayOp::Related => 3,
            GatewayOp::Joined => 4,
            GatewayOp::Introspect => 5,
        }
    }
}

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    pub op: GatewayOp,
    pub store: String,
    /// Field queried, for keyed and prefix lookups.
    pub field: Option<String>,
}

/// Snapshot of per-operation call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCallCounts {
    pub exact_key: u64,
    pub prefix: u64,
    pub scan: u64,
    pub related: u64,
    pub joined: u64,
    pub introspect: u64,
}

impl GatewayCallCounts {
    pub fn total(&self) -> u64 {
        self.exact_key + self.prefix + self.scan + self.related + self.joined + self.introspect
    }
}

/// In-memory implementation of [`BackendGateway`].
#[derive(Debug)]
pub struct InMemoryGateway {
    stores: RwLock<HashMap<String, Vec<Record>>>,
    columns: RwLock<HashMap<String, Vec<String>>>,
    failures: RwLock<HashMap<GatewayOp, GatewayError>>,
    calls: Mutex<Vec<GatewayCall>>,
    counts: [AtomicU64; 6],
    prefix_queries: bool,
    delay: Option<Duration>,
    layout: StoreLayout,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    /// Create an empty gateway using the default store layout.
    pub fn new() -> Self {
        Self::with_layout(StoreLayout::default())
    }

    pub fn with_layout(layout: StoreLayout) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            columns: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            counts: Default::default(),
            prefix_queries: true,
            delay: None,
            layout,
        }
    }

    /// Disable `fetch_by_prefix`, forcing callers onto the scan fallback.
    pub fn without_prefix_queries(mut self) -> Self {
        self.prefix_queries = false;
        self
    }

    /// Sleep for `delay` at the start of every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    // ========================================================================
    // SEEDING
    // ========================================================================

    /// Append a raw record to a store.
    pub fn insert(&self, store: &str, record: Record) {
        write(&self.stores)
            .entry(store.to_string())
            .or_default()
            .push(record);
    }

    /// Insert an order with its join shape, mirroring its assignments into
    /// the assignments store.
    pub fn insert_order(&self, order: &ResolvedOrder) {
        self.insert(&self.layout.orders, to_record(serde_json::to_value(order)));
        for assignment in &order.assignments {
            self.insert(
                &self.layout.assignments,
                to_record(serde_json::to_value(assignment)),
            );
        }
    }

    /// Insert a notification pointing at `order_key`.
    pub fn insert_notification(&self, notification_id: &str, order_key: &str) {
        let mut record = Record::new();
        record.insert(
            self.layout.notification_key_field.clone(),
            Value::String(notification_id.to_string()),
        );
        record.insert(
            self.layout.notification_order_field.clone(),
            Value::String(order_key.to_string()),
        );
        self.insert(&self.layout.notifications, record);
    }

    /// Pin the introspected columns of a store.
    ///
    /// Without this, a store's columns are the union of its records' keys.
    pub fn set_columns(&self, store: &str, columns: &[&str]) {
        write(&self.columns).insert(
            store.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
    }

    // ========================================================================
    // FAULT INJECTION
    // ========================================================================

    /// Make every subsequent call of `op` fail with `error`.
    pub fn fail(&self, op: GatewayOp, error: GatewayError) {
        write(&self.failures).insert(op, error);
    }

    pub fn clear_failure(&self, op: GatewayOp) {
        write(&self.failures).remove(&op);
    }

    pub fn clear_failures(&self) {
        write(&self.failures).clear();
    }

    // ========================================================================
    // CALL ACCOUNTING
    // ========================================================================

    pub fn call_counts(&self) -> GatewayCallCounts {
        let load = |op: GatewayOp| self.counts[op.index()].load(Ordering::SeqCst);
        GatewayCallCounts {
            exact_key: load(GatewayOp::ExactKey),
            prefix: load(GatewayOp::Prefix),
            scan: load(GatewayOp::Scan),
            related: load(GatewayOp::Related),
            joined: load(GatewayOp::Joined),
            introspect: load(GatewayOp::Introspect),
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls of `op` that queried `field`.
    pub fn calls_on_field(&self, op: GatewayOp, field: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.op == op && call.field.as_deref() == Some(field))
            .count()
    }

    pub fn reset_calls(&self) {
        for op in GatewayOp::ALL {
            self.counts[op.index()].store(0, Ordering::SeqCst);
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    async fn enter(&self, op: GatewayOp, store: &str, field: Option<&str>) -> GatewayResult<()> {
        self.counts[op.index()].fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(GatewayCall {
                op,
                store: store.to_string(),
                field: field.map(str::to_string),
            });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = read(&self.failures).get(&op).cloned();
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Key column of `store` according to the layout.
    fn key_field(&self, store: &str) -> &str {
        if store == self.layout.notifications {
            &self.layout.notification_key_field
        } else {
            &self.layout.order_key_field
        }
    }

    fn records(&self, store: &str) -> Vec<Record> {
        read(&self.stores).get(store).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl BackendGateway for InMemoryGateway {
    async fn fetch_by_exact_key(
        &self,
        store: &str,
        field: &str,
        key: &str,
        _projection: &str,
    ) -> GatewayResult<Option<Record>> {
        self.enter(GatewayOp::ExactKey, store, Some(field)).await?;
        Ok(self
            .records(store)
            .into_iter()
            .find(|record| field_text(record, field).as_deref() == Some(key)))
    }

    async fn fetch_by_prefix(
        &self,
        store: &str,
        field: &str,
        prefix: &str,
        _projection: &str,
        limit: usize,
    ) -> GatewayResult<Vec<Record>> {
        if !self.prefix_queries {
            return Err(GatewayError::Unsupported {
                operation: "fetch_by_prefix",
            });
        }
        self.enter(GatewayOp::Prefix, store, Some(field)).await?;
        let mut hits: Vec<(String, Record)> = self
            .records(store)
            .into_iter()
            .filter_map(|record| {
                let value = field_text(&record, field)?;
                value.starts_with(prefix).then_some((value, record))
            })
            .collect();
        hits.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(hits.into_iter().take(limit).map(|(_, record)| record).collect())
    }

    async fn scan(&self, store: &str, _projection: &str, limit: usize) -> GatewayResult<Vec<Record>> {
        self.enter(GatewayOp::Scan, store, None).await?;
        Ok(self.records(store).into_iter().take(limit).collect())
    }

    async fn fetch_related(
        &self,
        secondary_store: &str,
        key: &str,
    ) -> GatewayResult<Option<Record>> {
        let key_field = self.key_field(secondary_store);
        self.enter(GatewayOp::Related, secondary_store, Some(key_field)).await?;
        Ok(self
            .records(secondary_store)
            .into_iter()
            .find(|record| field_text(record, key_field).as_deref() == Some(key)))
    }

    async fn fetch_joined(
        &self,
        store: &str,
        join: &JoinSpec,
        filters: &[Filter],
    ) -> GatewayResult<Option<Record>> {
        self.enter(GatewayOp::Joined, store, None).await?;
        let related = self.records(&join.relation);

        let (relation_filters, base_filters): (Vec<&Filter>, Vec<&Filter>) = filters
            .iter()
            .partition(|f| f.relation() == Some(join.relation.as_str()));

        for mut base in self.records(store) {
            if !base_filters.iter().all(|f| matches_filter(&base, f)) {
                continue;
            }
            let Some(base_key) = field_text(&base, self.key_field(store)) else {
                continue;
            };
            let joined: Vec<Value> = related
                .iter()
                .filter(|row| field_text(row, &join.foreign_key).as_deref() == Some(base_key.as_str()))
                .filter(|row| relation_filters.iter().all(|f| matches_filter(row, f)))
                .cloned()
                .map(Value::Object)
                .collect();
            if !joined.is_empty() {
                base.insert(join.relation.clone(), Value::Array(joined));
                return Ok(Some(base));
            }
        }
        Ok(None)
    }

    async fn introspect_columns(&self, store: &str) -> GatewayResult<Vec<String>> {
        self.enter(GatewayOp::Introspect, store, None).await?;
        if let Some(columns) = read(&self.columns).get(store) {
            return Ok(columns.clone());
        }
        let mut columns: Vec<String> = self
            .records(store)
            .iter()
            .flat_map(|record| record.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        Ok(columns)
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Serialize a seeded model value into a record.
///
/// Seeding is test and development setup, so a value that does not
/// serialize to a JSON object is a bug in the caller.
fn to_record(value: serde_json::Result<Value>) -> Record {
    match value.expect("seeded value serializes to JSON") {
        Value::Object(record) => record,
        other => panic!("seeded value must serialize to a JSON object, got {other}"),
    }
}

/// Text form of a scalar field.
fn field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    let expected = match &filter.value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    };
    expected.is_some() && field_text(record, filter.column()) == expected
}
