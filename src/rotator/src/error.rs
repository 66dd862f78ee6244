use std::time::Duration;

use common::config::ConfigError;
use common::event::EventError;
use common::storage::SessionError;
use thiserror::Error;

/// Failure talking to the object store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    ObjectStore(#[from] object_store::Error),

    #[error("Object store request timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors that stop a prefix or the whole run.
///
/// Per-key failures inside a successful bulk delete are not errors; they are
/// carried in [`crate::deleter::BatchResult`].
#[derive(Error, Debug)]
pub enum RotationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to establish object store session: {0}")]
    Session(#[from] SessionError),

    #[error("Failed to parse invocation event: {0}")]
    Parse(#[from] EventError),

    #[error("Failed to list objects under prefix '{prefix}': {source}")]
    List {
        prefix: String,
        #[source]
        source: StoreError,
    },

    #[error("Bulk delete failed for prefix '{prefix}' after {deleted} deletions: {source}")]
    Delete {
        prefix: String,
        /// Keys removed by earlier requests before the failing one.
        deleted: usize,
        #[source]
        source: StoreError,
    },
}

impl RotationError {
    pub fn prefix(&self) -> Option<&str> {
        match self {
            RotationError::List { prefix, .. } | RotationError::Delete { prefix, .. } => {
                Some(prefix)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_errors_carry_prefix() {
        let error = RotationError::List {
            prefix: "uk/reporting/".to_string(),
            source: StoreError::Timeout(Duration::from_secs(30)),
        };
        assert_eq!(error.prefix(), Some("uk/reporting/"));
        assert!(error.to_string().contains("uk/reporting/"));
        assert!(error.to_string().contains("timed out"));

        let error = RotationError::Config(ConfigError::EmptyBucket);
        assert_eq!(error.prefix(), None);
    }
}
