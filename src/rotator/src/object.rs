use chrono::{DateTime, Utc};
use object_store::ObjectMeta;

/// An object as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    /// Key, unique within the bucket.
    pub key: String,
    pub last_modified: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
}

impl From<ObjectMeta> for StorageObject {
    fn from(meta: ObjectMeta) -> Self {
        Self {
            key: meta.location.to_string(),
            last_modified: meta.last_modified,
            size: meta.size,
        }
    }
}

/// An object selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionCandidate {
    pub key: String,
    /// Whole days since last modification at evaluation time.
    pub age_days: i64,
    pub size: u64,
}

/// A key the store refused to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyError {
    pub key: String,
    pub reason: String,
}

/// Per-key outcome of a single bulk-delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkDeleteOutput {
    pub deleted: Vec<String>,
    pub errors: Vec<KeyError>,
}
