//! Bulk deletion of one prefix's candidates.
//!
//! Candidates are split into requests of at most `batch_size` keys. Keys the
//! store rejects individually are reported and logged; only a failure of a
//! request as a whole fails the prefix. Dry-run never reaches the store.

use std::collections::HashMap;
use std::sync::Arc;

use crate::bucket::BucketClient;
use crate::error::RotationError;
use crate::metrics::RotationMetrics;
use crate::object::{DeletionCandidate, KeyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Nothing to delete; no request was made.
    NoCandidates,
    /// Candidates were logged only.
    DryRun,
    /// Bulk-delete requests were issued.
    Deleted,
}

/// Aggregated result of every bulk-delete request for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub outcome: BatchOutcome,
    /// Keys submitted (or, in dry-run, that would have been).
    pub submitted: usize,
    pub deleted: Vec<String>,
    pub failed: Vec<KeyError>,
    /// Bulk-delete requests issued.
    pub requests: usize,
}

impl BatchResult {
    fn empty(outcome: BatchOutcome, submitted: usize) -> Self {
        Self {
            outcome,
            submitted,
            deleted: Vec::new(),
            failed: Vec::new(),
            requests: 0,
        }
    }

    /// Some keys were rejected inside otherwise successful requests.
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

pub struct BatchDeleter {
    client: Arc<dyn BucketClient>,
    dry_run: bool,
    batch_size: usize,
    metrics: RotationMetrics,
}

impl BatchDeleter {
    pub fn new(
        client: Arc<dyn BucketClient>,
        dry_run: bool,
        batch_size: usize,
        metrics: RotationMetrics,
    ) -> Self {
        Self {
            client,
            dry_run,
            batch_size: batch_size.max(1),
            metrics,
        }
    }

    /// Delete `candidates` found under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::Delete`] when a bulk-delete request fails as a
    /// whole. Keys deleted by earlier requests stay deleted and are counted in
    /// the error.
    pub async fn delete(
        &self,
        prefix: &str,
        candidates: &[DeletionCandidate],
    ) -> Result<BatchResult, RotationError> {
        if candidates.is_empty() {
            tracing::info!(prefix = %prefix, "No deletion candidates");
            return Ok(BatchResult::empty(BatchOutcome::NoCandidates, 0));
        }

        if self.dry_run {
            for candidate in candidates {
                tracing::info!(
                    bucket = %self.client.bucket(),
                    prefix = %prefix,
                    key = %candidate.key,
                    age_days = candidate.age_days,
                    size_bytes = candidate.size,
                    "[DRY-RUN] Would delete object"
                );
            }
            self.metrics.record_keys_skipped(candidates.len());
            return Ok(BatchResult::empty(BatchOutcome::DryRun, candidates.len()));
        }

        let sizes: HashMap<&str, u64> = candidates
            .iter()
            .map(|candidate| (candidate.key.as_str(), candidate.size))
            .collect();

        let total_batches = candidates.len().div_ceil(self.batch_size);
        let mut result = BatchResult::empty(BatchOutcome::Deleted, candidates.len());

        tracing::info!(
            bucket = %self.client.bucket(),
            prefix = %prefix,
            candidates = candidates.len(),
            batch_size = self.batch_size,
            total_batches,
            "Starting bulk deletion"
        );

        for (batch_idx, batch) in candidates.chunks(self.batch_size).enumerate() {
            let keys: Vec<String> = batch.iter().map(|c| c.key.clone()).collect();

            tracing::debug!(
                prefix = %prefix,
                batch = batch_idx + 1,
                total_batches,
                batch_size = keys.len(),
                "Submitting bulk delete request"
            );

            self.metrics.record_delete_request();
            result.requests += 1;

            let output = self.client.delete_objects(&keys).await.map_err(|source| {
                RotationError::Delete {
                    prefix: prefix.to_string(),
                    deleted: result.deleted.len(),
                    source,
                }
            })?;

            for key in &output.deleted {
                tracing::debug!(prefix = %prefix, key = %key, "Deleted object");
            }
            for failure in &output.errors {
                tracing::warn!(
                    prefix = %prefix,
                    key = %failure.key,
                    reason = %failure.reason,
                    "Failed to delete object"
                );
            }

            let bytes: u64 = output
                .deleted
                .iter()
                .filter_map(|key| sizes.get(key.as_str()))
                .sum();
            self.metrics.record_bytes_reclaimed(bytes);
            self.metrics.record_keys_deleted(output.deleted.len());
            self.metrics.record_keys_failed(output.errors.len());

            result.deleted.extend(output.deleted);
            result.failed.extend(output.errors);
        }

        if result.is_partial() {
            tracing::warn!(
                prefix = %prefix,
                deleted = result.deleted.len(),
                failed = result.failed.len(),
                "Bulk deletion completed with per-key failures"
            );
        } else {
            tracing::info!(
                prefix = %prefix,
                deleted = result.deleted.len(),
                requests = result.requests,
                "Bulk deletion complete"
            );
        }

        Ok(result)
    }
}
