//! Drives list → evaluate → delete for every configured prefix.
//!
//! Prefixes never share candidates: each one is listed, filtered and deleted on
//! its own. What a failing prefix does to the rest of the run is decided by
//! [`PrefixErrorPolicy`].

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use uuid::Uuid;

use common::PrefixErrorPolicy;
use common::config::Configuration;
use common::storage::create_bucket_store;

use crate::bucket::{BucketClient, ObjectStoreBucket};
use crate::deleter::BatchDeleter;
use crate::error::RotationError;
use crate::evaluator::RetentionEvaluator;
use crate::metrics::RotationMetrics;
use crate::object::DeletionCandidate;
use crate::policy::RetentionPolicy;
use crate::report::{PrefixReport, RunReport};

pub struct Rotator {
    policy: RetentionPolicy,
    client: Arc<dyn BucketClient>,
    deleter: BatchDeleter,
    metrics: RotationMetrics,
}

impl Rotator {
    pub fn new(
        policy: RetentionPolicy,
        client: Arc<dyn BucketClient>,
        metrics: RotationMetrics,
    ) -> Self {
        let deleter = BatchDeleter::new(
            client.clone(),
            policy.dry_run,
            policy.batch_size,
            metrics.clone(),
        );
        Self {
            policy,
            client,
            deleter,
            metrics,
        }
    }

    /// Validate `config` and open a session to its bucket.
    ///
    /// # Errors
    ///
    /// [`RotationError::Config`] before any store access, or
    /// [`RotationError::Session`] when the client cannot be built.
    pub fn from_config(
        config: &Configuration,
        metrics: RotationMetrics,
    ) -> Result<Self, RotationError> {
        config.validate()?;

        let store = create_bucket_store(&config.bucket, &config.storage)?;
        let client = ObjectStoreBucket::new(
            config.bucket.clone(),
            store,
            config.storage.request_timeout,
        );

        Ok(Self::new(
            RetentionPolicy::from(config),
            Arc::new(client),
            metrics,
        ))
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &RotationMetrics {
        &self.metrics
    }

    /// One rotation pass against the current wall clock.
    pub async fn run(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    /// One rotation pass with every age measured against `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let evaluator = RetentionEvaluator::new(&self.policy, now);

        tracing::info!(
            run_id = %run_id,
            bucket = %self.client.bucket(),
            prefixes = ?self.policy.prefixes,
            name_filter = ?self.policy.name_filter,
            threshold_days = self.policy.threshold_days,
            dry_run = self.policy.dry_run,
            reference_time = %now,
            "Starting rotation run"
        );

        // Set by the first failure under `Abort`. Pipelines that already
        // started run to completion; the rest report as skipped.
        let aborted = AtomicBool::new(false);

        // `buffered` keeps configured order, so reports line up with prefixes
        let prefixes: Vec<PrefixReport> = stream::iter(self.policy.prefixes.iter())
            .map(|prefix| self.process_prefix(prefix, &evaluator, &aborted))
            .buffered(self.policy.max_concurrent_prefixes)
            .collect()
            .await;

        RunReport {
            run_id,
            bucket: self.client.bucket().to_string(),
            dry_run: self.policy.dry_run,
            started_at,
            completed_at: Utc::now(),
            prefixes,
        }
    }

    async fn process_prefix(
        &self,
        prefix: &str,
        evaluator: &RetentionEvaluator,
        aborted: &AtomicBool,
    ) -> PrefixReport {
        if aborted.load(Ordering::SeqCst) {
            tracing::warn!(prefix = %prefix, "Skipping prefix after an earlier failure");
            return PrefixReport::skipped(prefix);
        }

        let started = Instant::now();
        let mut report = PrefixReport::new(prefix);

        tracing::info!(prefix = %prefix, "Processing prefix");

        match self.collect_candidates(prefix, evaluator, &mut report).await {
            Ok(candidates) => {
                report.candidates = candidates.len();
                self.metrics.record_candidates(candidates.len());

                tracing::info!(
                    prefix = %prefix,
                    objects_listed = report.objects_listed,
                    candidates = candidates.len(),
                    "Evaluated prefix"
                );

                match self.deleter.delete(prefix, &candidates).await {
                    Ok(batch) => report.apply_batch(batch),
                    Err(error) => report.fail(error),
                }
            }
            Err(error) => report.fail(error),
        }

        if let Some(error) = report.error() {
            tracing::error!(prefix = %prefix, error = %error, "Prefix failed");
            self.metrics.record_prefix_failed();

            if self.policy.on_prefix_error == PrefixErrorPolicy::Abort
                && !aborted.swap(true, Ordering::SeqCst)
            {
                tracing::error!(prefix = %prefix, "Aborting run after prefix failure");
            }
        }
        self.metrics.record_prefix_processed();

        report.duration = started.elapsed();
        report
    }

    async fn collect_candidates(
        &self,
        prefix: &str,
        evaluator: &RetentionEvaluator,
        report: &mut PrefixReport,
    ) -> Result<Vec<DeletionCandidate>, RotationError> {
        let mut objects = self.client.list(prefix);
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        while let Some(object) = objects.next().await {
            let object = object.map_err(|source| RotationError::List {
                prefix: prefix.to_string(),
                source,
            })?;

            report.objects_listed += 1;
            self.metrics.record_objects_listed(1);

            if let Some(candidate) = evaluator.evaluate(&object)
                && seen.insert(candidate.key.clone())
            {
                tracing::debug!(
                    prefix = %prefix,
                    key = %candidate.key,
                    age_days = candidate.age_days,
                    "Identified deletion candidate"
                );
                candidates.push(candidate);
            }
        }

        Ok(candidates)
    }
}
