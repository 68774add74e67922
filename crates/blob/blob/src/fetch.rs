//! Bounded-concurrency transfers that keep results in input order.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::error::BlobError;
use crate::store::ObjectStore;

/// Download every address with at most `concurrency` requests in flight.
///
/// Results are returned in the order of `addresses`, regardless of which
/// request completes first. A `concurrency` of 0 or 1 is strictly sequential.
pub async fn download_ordered(
    store: &dyn ObjectStore,
    addresses: &[String],
    concurrency: usize,
) -> Vec<Result<Bytes, BlobError>> {
    debug!(count = addresses.len(), concurrency, "downloading blobs");
    if concurrency <= 1 {
        return store.download_many(addresses).await;
    }
    stream::iter(addresses)
        .map(|address| store.download(address))
        .buffered(concurrency)
        .collect()
        .await
}

/// Upload `(name, data)` pairs with at most `concurrency` requests in flight.
///
/// The address (or error) at index `i` belongs to `items[i]`.
pub async fn upload_ordered(
    store: &dyn ObjectStore,
    items: Vec<(String, Bytes)>,
    concurrency: usize,
) -> Vec<Result<String, BlobError>> {
    debug!(count = items.len(), concurrency, "uploading blobs");
    stream::iter(items)
        .map(|(name, data)| async move { store.upload(&name, data).await })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
