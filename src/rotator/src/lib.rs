//! Retention enforcement for files rotated into an object store bucket.
//!
//! A run lists every configured prefix, picks the objects that are at least
//! `threshold_days` old (and match the optional name filter), and removes them
//! with bulk-delete requests. Dry-run mode logs the candidates instead.
//!
//! ## Architecture
//!
//! - `bucket`: listing and bulk deletion behind the [`BucketClient`] seam
//! - `evaluator`: the pure candidacy decision
//! - `deleter`: chunked bulk deletion with per-key outcomes
//! - `orchestrator`: per-prefix pipeline and failure policy
//! - `report` / `metrics`: diagnostics for a run
//!
//! ## Usage
//!
//! ```no_run
//! use common::config::Configuration;
//! use rotator::{RotationMetrics, Rotator};
//!
//! # async fn example() -> Result<(), rotator::RotationError> {
//! let config = Configuration::load(None)?;
//! let rotator = Rotator::from_config(&config, RotationMetrics::new())?;
//!
//! let report = rotator.run().await;
//! report.log();
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod bucket;
pub mod deleter;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod object;
pub mod orchestrator;
pub mod policy;
pub mod report;

// Re-export commonly used types
pub use bucket::{BucketClient, ObjectStoreBucket};
pub use deleter::{BatchDeleter, BatchOutcome, BatchResult};
pub use error::{RotationError, StoreError};
pub use evaluator::{RetentionEvaluator, is_candidate};
pub use metrics::{MetricsSummary, RotationMetrics};
pub use object::{BulkDeleteOutput, DeletionCandidate, KeyError, StorageObject};
pub use orchestrator::Rotator;
pub use policy::RetentionPolicy;
pub use report::{PrefixOutcome, PrefixReport, RunReport};
