//! Rotation Metrics
//!
//! Thread-safe counters shared by every prefix pipeline in a run.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Thread-safe metrics for tracking rotation runs
#[derive(Debug, Clone)]
pub struct RotationMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    prefixes_processed: AtomicUsize,
    prefixes_failed: AtomicUsize,
    objects_listed: AtomicUsize,
    candidates_found: AtomicUsize,
    delete_requests: AtomicUsize,
    keys_deleted: AtomicUsize,
    keys_failed: AtomicUsize,
    /// Candidates only logged because of dry-run
    keys_skipped: AtomicUsize,
    bytes_reclaimed: AtomicU64,
}

impl Default for RotationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    pub fn record_prefix_processed(&self) {
        self.inner.prefixes_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prefix_failed(&self) {
        self.inner.prefixes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_objects_listed(&self, count: usize) {
        self.inner.objects_listed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_candidates(&self, count: usize) {
        self.inner.candidates_found.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_delete_request(&self) {
        self.inner.delete_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_keys_deleted(&self, count: usize) {
        self.inner.keys_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_keys_failed(&self, count: usize) {
        self.inner.keys_failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_keys_skipped(&self, count: usize) {
        self.inner.keys_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_bytes_reclaimed(&self, bytes: u64) {
        self.inner.bytes_reclaimed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn prefixes_processed(&self) -> usize {
        self.inner.prefixes_processed.load(Ordering::Relaxed)
    }

    pub fn prefixes_failed(&self) -> usize {
        self.inner.prefixes_failed.load(Ordering::Relaxed)
    }

    pub fn objects_listed(&self) -> usize {
        self.inner.objects_listed.load(Ordering::Relaxed)
    }

    pub fn candidates_found(&self) -> usize {
        self.inner.candidates_found.load(Ordering::Relaxed)
    }

    pub fn delete_requests(&self) -> usize {
        self.inner.delete_requests.load(Ordering::Relaxed)
    }

    pub fn keys_deleted(&self) -> usize {
        self.inner.keys_deleted.load(Ordering::Relaxed)
    }

    pub fn keys_failed(&self) -> usize {
        self.inner.keys_failed.load(Ordering::Relaxed)
    }

    pub fn keys_skipped(&self) -> usize {
        self.inner.keys_skipped.load(Ordering::Relaxed)
    }

    pub fn bytes_reclaimed(&self) -> u64 {
        self.inner.bytes_reclaimed.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            prefixes_processed: self.prefixes_processed(),
            prefixes_failed: self.prefixes_failed(),
            objects_listed: self.objects_listed(),
            candidates_found: self.candidates_found(),
            delete_requests: self.delete_requests(),
            keys_deleted: self.keys_deleted(),
            keys_failed: self.keys_failed(),
            keys_skipped: self.keys_skipped(),
            bytes_reclaimed: self.bytes_reclaimed(),
        }
    }
}

/// Point-in-time copy of [`RotationMetrics`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSummary {
    pub prefixes_processed: usize,
    pub prefixes_failed: usize,
    pub objects_listed: usize,
    pub candidates_found: usize,
    pub delete_requests: usize,
    pub keys_deleted: usize,
    pub keys_failed: usize,
    pub keys_skipped: usize,
    pub bytes_reclaimed: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        tracing::info!(
            prefixes_processed = self.prefixes_processed,
            prefixes_failed = self.prefixes_failed,
            objects_listed = self.objects_listed,
            candidates_found = self.candidates_found,
            delete_requests = self.delete_requests,
            keys_deleted = self.keys_deleted,
            keys_failed = self.keys_failed,
            keys_skipped = self.keys_skipped,
            bytes_reclaimed = self.bytes_reclaimed,
            "Rotation metrics"
        );
    }
}
