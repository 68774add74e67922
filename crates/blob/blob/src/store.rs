use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;

/// Pluggable object store backend for attachment binaries.
///
/// Binaries live in a single pre-provisioned container. Uploading under an
/// existing name overwrites the previous content.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `name` and return the durable address of the binary.
    ///
    /// The container is created on first use if it does not exist.
    async fn upload(&self, name: &str, data: Bytes) -> Result<String, BlobError>;

    /// Fetch the binary at an address previously returned by [`upload`](Self::upload).
    async fn download(&self, address: &str) -> Result<Bytes, BlobError>;

    /// Fetch several binaries one at a time.
    ///
    /// Each address is resolved independently; the result at index `i`
    /// belongs to `addresses[i]`.
    async fn download_many(&self, addresses: &[String]) -> Vec<Result<Bytes, BlobError>> {
        let mut results = Vec::with_capacity(addresses.len());
        for address in addresses {
            results.push(self.download(address).await);
        }
        results
    }
}
