//! Retention decision for a single object.
//!
//! An object is a deletion candidate when it is at least `threshold_days` whole
//! days old and, if a name filter is configured, its key contains the filter.
//! Age is measured against one reference instant per run so every decision in
//! a run is made against the same clock.

use chrono::{DateTime, Utc};

use crate::object::{DeletionCandidate, StorageObject};
use crate::policy::RetentionPolicy;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct RetentionEvaluator {
    threshold_days: i64,
    name_filter: Option<String>,
    now: DateTime<Utc>,
}

impl RetentionEvaluator {
    pub fn new(policy: &RetentionPolicy, now: DateTime<Utc>) -> Self {
        Self {
            threshold_days: i64::from(policy.threshold_days),
            name_filter: policy.name_filter.clone(),
            now,
        }
    }

    /// Reference instant every age is computed against.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Whole days elapsed since `last_modified`, rounded down.
    ///
    /// Timestamps after the reference instant yield a negative age.
    pub fn age_days(&self, last_modified: DateTime<Utc>) -> i64 {
        (self.now - last_modified)
            .num_seconds()
            .div_euclid(SECONDS_PER_DAY)
    }

    pub fn matches_filter(&self, key: &str) -> bool {
        self.name_filter
            .as_deref()
            .is_none_or(|filter| key.contains(filter))
    }

    pub fn is_candidate(&self, object: &StorageObject) -> bool {
        self.evaluate(object).is_some()
    }

    pub fn evaluate(&self, object: &StorageObject) -> Option<DeletionCandidate> {
        let age_days = self.age_days(object.last_modified);

        if age_days < self.threshold_days {
            tracing::trace!(
                key = %object.key,
                age_days,
                threshold_days = self.threshold_days,
                "Object within retention window, keeping"
            );
            return None;
        }

        if !self.matches_filter(&object.key) {
            tracing::trace!(key = %object.key, "Object does not match name filter, keeping");
            return None;
        }

        Some(DeletionCandidate {
            key: object.key.clone(),
            age_days,
            size: object.size,
        })
    }
}

/// One-off form of [`RetentionEvaluator::is_candidate`].
pub fn is_candidate(object: &StorageObject, policy: &RetentionPolicy, now: DateTime<Utc>) -> bool {
    RetentionEvaluator::new(policy, now).is_candidate(object)
}
