//! Access to the bucket: paginated listing and bulk deletion.
//!
//! [`BucketClient`] is the only seam the pipeline talks to, so the listing and
//! deletion paths can be exercised against in-memory fakes.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use object_store::{ObjectMeta, ObjectStore};
use object_store::path::Path as ObjectPath;
use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::object::{BulkDeleteOutput, KeyError, StorageObject};

#[async_trait]
pub trait BucketClient: Send + Sync {
    /// Bucket this client is bound to.
    fn bucket(&self) -> &str;

    /// Every object under `prefix`, following continuation tokens until the
    /// store reports the end. Single pass; the first error ends the listing.
    fn list(&self, prefix: &str) -> BoxStream<'_, Result<StorageObject, StoreError>>;

    /// Delete `keys` in one request.
    ///
    /// `Err` means the request itself failed. Keys the store rejected
    /// individually are returned in [`BulkDeleteOutput::errors`].
    async fn delete_objects(&self, keys: &[String]) -> Result<BulkDeleteOutput, StoreError>;
}

/// [`BucketClient`] over any `object_store` backend.
pub struct ObjectStoreBucket {
    bucket: String,
    store: Arc<dyn ObjectStore>,
    request_timeout: Duration,
}

impl ObjectStoreBucket {
    pub fn new(
        bucket: impl Into<String>,
        store: Arc<dyn ObjectStore>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            store,
            request_timeout,
        }
    }
}

#[async_trait]
impl BucketClient for ObjectStoreBucket {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn list(&self, prefix: &str) -> BoxStream<'_, Result<StorageObject, StoreError>> {
        let path = ObjectPath::from(prefix);

        tracing::debug!(bucket = %self.bucket, prefix = %path, "Listing objects");

        bounded_listing(self.store.list(Some(&path)), self.request_timeout)
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<BulkDeleteOutput, StoreError> {
        let mut output = BulkDeleteOutput::default();

        let mut paths = Vec::with_capacity(keys.len());
        for key in keys {
            match ObjectPath::parse(key) {
                Ok(path) => paths.push((key, path)),
                Err(e) => output.errors.push(KeyError {
                    key: key.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        if paths.is_empty() {
            return Ok(output);
        }

        let locations = stream::iter(paths.iter().map(|(_, path)| Ok(path.clone()))).boxed();
        let results =
            collect_bounded(self.store.delete_stream(locations), self.request_timeout).await?;

        let submitted: Vec<&String> = paths.into_iter().map(|(key, _)| key).collect();
        pair_results(&submitted, results, &mut output)?;

        Ok(output)
    }
}

/// Maps a store listing onto [`StorageObject`]s. Each item must arrive within
/// `timeout`, which bounds every page fetch behind it.
fn bounded_listing<'a>(
    listing: BoxStream<'a, object_store::Result<ObjectMeta>>,
    timeout: Duration,
) -> BoxStream<'a, Result<StorageObject, StoreError>> {
    tokio_stream::StreamExt::timeout(listing, timeout)
        .map(move |item| match item {
            Ok(Ok(meta)) => Ok(StorageObject::from(meta)),
            Ok(Err(e)) => Err(StoreError::from(e)),
            Err(_elapsed) => Err(StoreError::Timeout(timeout)),
        })
        .boxed()
}

/// Drains a bulk-delete result stream, giving up after `timeout`.
async fn collect_bounded(
    results: BoxStream<'_, object_store::Result<ObjectPath>>,
    timeout: Duration,
) -> Result<Vec<object_store::Result<ObjectPath>>, StoreError> {
    tokio::time::timeout(timeout, results.collect())
        .await
        .map_err(|_| StoreError::Timeout(timeout))
}

/// Matches bulk-delete results to the keys they were submitted for.
///
/// The store yields one result per key, in request order. Anything else means
/// the request failed as a whole.
fn pair_results(
    keys: &[&String],
    results: Vec<object_store::Result<ObjectPath>>,
    output: &mut BulkDeleteOutput,
) -> Result<(), StoreError> {
    if results.len() != keys.len() {
        let expected = keys.len();
        let source = results
            .into_iter()
            .find_map(Result::err)
            .unwrap_or_else(|| object_store::Error::Generic {
                store: "bulk-delete",
                source: format!("expected {expected} results, store returned fewer").into(),
            });
        return Err(StoreError::from(source));
    }

    for (key, result) in keys.iter().zip(results) {
        match result {
            // Already gone; deleting is idempotent
            Ok(_) | Err(object_store::Error::NotFound { .. }) => {
                output.deleted.push((*key).clone())
            }
            Err(e) => output.errors.push(KeyError {
                key: (*key).clone(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(())
}
