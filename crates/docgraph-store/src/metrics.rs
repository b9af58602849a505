//! Per-primitive call counters.
//!
//! Both bundled backends count every primitive they serve. The counters make
//! round trips observable: how many fetches a lazy access caused, or whether
//! schema provisioning issued any creation call.

use std::sync::atomic::{AtomicU64, Ordering};

/// Store primitive, for metrics tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// List collections.
    ListCollections,
    /// Create a collection.
    CreateCollection,
    /// List indexes.
    ListIndexes,
    /// Create an index.
    CreateIndex,
    /// Wait for an index.
    WaitForIndex,
    /// Get by identity.
    Get,
    /// Upsert.
    Upsert,
    /// Query by index.
    Query,
    /// Delete by identity.
    Delete,
}

/// Call counters for a store.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    list_collections: AtomicU64,
    create_collection: AtomicU64,
    list_indexes: AtomicU64,
    create_index: AtomicU64,
    wait_for_index: AtomicU64,
    get: AtomicU64,
    upsert: AtomicU64,
    query: AtomicU64,
    delete: AtomicU64,
}

/// Point-in-time copy of [`StoreMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub list_collections: u64,
    pub create_collection: u64,
    pub list_indexes: u64,
    pub create_index: u64,
    pub wait_for_index: u64,
    pub get: u64,
    pub upsert: u64,
    pub query: u64,
    pub delete: u64,
}

impl StoreMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one call of `op`.
    pub fn record(&self, op: StoreOp) {
        self.counter(op).fetch_add(1, Ordering::Relaxed);
    }

    /// Calls of `op` so far.
    pub fn count(&self, op: StoreOp) -> u64 {
        self.counter(op).load(Ordering::Relaxed)
    }

    /// Copy all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            list_collections: self.count(StoreOp::ListCollections),
            create_collection: self.count(StoreOp::CreateCollection),
            list_indexes: self.count(StoreOp::ListIndexes),
            create_index: self.count(StoreOp::CreateIndex),
            wait_for_index: self.count(StoreOp::WaitForIndex),
            get: self.count(StoreOp::Get),
            upsert: self.count(StoreOp::Upsert),
            query: self.count(StoreOp::Query),
            delete: self.count(StoreOp::Delete),
        }
    }

    fn counter(&self, op: StoreOp) -> &AtomicU64 {
        match op {
            StoreOp::ListCollections => &self.list_collections,
            StoreOp::CreateCollection => &self.create_collection,
            StoreOp::ListIndexes => &self.list_indexes,
            StoreOp::CreateIndex => &self.create_index,
            StoreOp::WaitForIndex => &self.wait_for_index,
            StoreOp::Get => &self.get,
            StoreOp::Upsert => &self.upsert,
            StoreOp::Query => &self.query,
            StoreOp::Delete => &self.delete,
        }
    }
}

impl MetricsSnapshot {
    /// Collection and index creation calls.
    pub fn creations(&self) -> u64 {
        self.create_collection + self.create_index
    }

    /// Counter-wise difference `self - earlier`.
    pub fn since(&self, earlier: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            list_collections: self.list_collections - earlier.list_collections,
            create_collection: self.create_collection - earlier.create_collection,
            list_indexes: self.list_indexes - earlier.list_indexes,
            create_index: self.create_index - earlier.create_index,
            wait_for_index: self.wait_for_index - earlier.wait_for_index,
            get: self.get - earlier.get,
            upsert: self.upsert - earlier.upsert,
            query: self.query - earlier.query,
            delete: self.delete - earlier.delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let metrics = StoreMetrics::new();
        metrics.record(StoreOp::Get);
        metrics.record(StoreOp::Get);
        metrics.record(StoreOp::CreateIndex);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.get, 2);
        assert_eq!(snapshot.creations(), 1);
        assert_eq!(metrics.count(StoreOp::Upsert), 0);
    }

    #[test]
    fn test_since() {
        let metrics = StoreMetrics::new();
        metrics.record(StoreOp::Upsert);
        let before = metrics.snapshot();

        metrics.record(StoreOp::Upsert);
        metrics.record(StoreOp::Delete);

        let delta = metrics.snapshot().since(&before);
        assert_eq!(delta.upsert, 1);
        assert_eq!(delta.delete, 1);
        assert_eq!(delta.get, 0);
    }
}
