//! Per-prefix and per-run diagnostics.

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use crate::deleter::{BatchOutcome, BatchResult};
use crate::error::RotationError;
use crate::object::KeyError;

#[derive(Debug)]
pub enum PrefixOutcome {
    /// Listing found nothing eligible.
    NoCandidates,
    /// Candidates were logged, nothing was deleted.
    DryRun,
    /// Every candidate was deleted.
    Deleted,
    /// Some keys were rejected by the store; the prefix still counts as done.
    PartiallyDeleted,
    Failed(RotationError),
    /// Abandoned after an earlier prefix failed under the `abort` policy.
    Skipped,
}

#[derive(Debug)]
pub struct PrefixReport {
    pub prefix: String,
    pub objects_listed: usize,
    pub candidates: usize,
    pub deleted: usize,
    pub failed_keys: Vec<KeyError>,
    pub requests: usize,
    pub duration: Duration,
    pub outcome: PrefixOutcome,
}

impl PrefixReport {
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            objects_listed: 0,
            candidates: 0,
            deleted: 0,
            failed_keys: Vec::new(),
            requests: 0,
            duration: Duration::ZERO,
            outcome: PrefixOutcome::NoCandidates,
        }
    }

    pub(crate) fn skipped(prefix: &str) -> Self {
        Self {
            outcome: PrefixOutcome::Skipped,
            ..Self::new(prefix)
        }
    }

    pub(crate) fn apply_batch(&mut self, batch: BatchResult) {
        self.deleted = batch.deleted.len();
        self.requests = batch.requests;
        self.outcome = match batch.outcome {
            BatchOutcome::NoCandidates => PrefixOutcome::NoCandidates,
            BatchOutcome::DryRun => PrefixOutcome::DryRun,
            BatchOutcome::Deleted if batch.is_partial() => PrefixOutcome::PartiallyDeleted,
            BatchOutcome::Deleted => PrefixOutcome::Deleted,
        };
        self.failed_keys = batch.failed;
    }

    pub(crate) fn fail(&mut self, error: RotationError) {
        if let RotationError::Delete { deleted, .. } = &error {
            self.deleted = *deleted;
        }
        self.outcome = PrefixOutcome::Failed(error);
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, PrefixOutcome::Failed(_))
    }

    pub fn error(&self) -> Option<&RotationError> {
        match &self.outcome {
            PrefixOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self.outcome {
            PrefixOutcome::NoCandidates => "no-candidates",
            PrefixOutcome::DryRun => "dry-run",
            PrefixOutcome::Deleted => "deleted",
            PrefixOutcome::PartiallyDeleted => "partially-deleted",
            PrefixOutcome::Failed(_) => "failed",
            PrefixOutcome::Skipped => "skipped",
        }
    }
}

/// Outcome of one invocation across all prefixes.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub bucket: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// In configured prefix order.
    pub prefixes: Vec<PrefixReport>,
}

impl RunReport {
    /// True when no prefix failed or was skipped.
    pub fn is_success(&self) -> bool {
        self.prefixes
            .iter()
            .all(|p| !matches!(p.outcome, PrefixOutcome::Failed(_) | PrefixOutcome::Skipped))
    }

    pub fn failed_prefixes(&self) -> impl Iterator<Item = &PrefixReport> {
        self.prefixes.iter().filter(|p| p.is_failed())
    }

    pub fn prefix(&self, prefix: &str) -> Option<&PrefixReport> {
        self.prefixes.iter().find(|p| p.prefix == prefix)
    }

    pub fn total_candidates(&self) -> usize {
        self.prefixes.iter().map(|p| p.candidates).sum()
    }

    pub fn total_deleted(&self) -> usize {
        self.prefixes.iter().map(|p| p.deleted).sum()
    }

    pub fn total_failed_keys(&self) -> usize {
        self.prefixes.iter().map(|p| p.failed_keys.len()).sum()
    }

    pub fn log(&self) {
        for prefix in &self.prefixes {
            match prefix.error() {
                Some(error) => tracing::error!(
                    run_id = %self.run_id,
                    prefix = %prefix.prefix,
                    deleted = prefix.deleted,
                    error = %error,
                    "Prefix rotation failed"
                ),
                None => tracing::info!(
                    run_id = %self.run_id,
                    prefix = %prefix.prefix,
                    outcome = prefix.outcome_label(),
                    objects_listed = prefix.objects_listed,
                    candidates = prefix.candidates,
                    deleted = prefix.deleted,
                    failed_keys = prefix.failed_keys.len(),
                    duration_ms = prefix.duration.as_millis() as u64,
                    "Prefix rotation finished"
                ),
            }
        }

        tracing::info!(
            run_id = %self.run_id,
            bucket = %self.bucket,
            dry_run = self.dry_run,
            prefixes = self.prefixes.len(),
            failed_prefixes = self.failed_prefixes().count(),
            candidates = self.total_candidates(),
            deleted = self.total_deleted(),
            failed_keys = self.total_failed_keys(),
            duration_ms = (self.completed_at - self.started_at).num_milliseconds(),
            success = self.is_success(),
            "Rotation run completed"
        );
    }
}
