use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::debug;

use resorts_blob::error::BlobError;
use resorts_blob::store::ObjectStore;

const SCHEME: &str = "memory://";

/// In-memory [`ObjectStore`] backed by a [`DashMap`].
///
/// Addresses have the form `memory://{container}/{name}`. Binaries survive
/// for the lifetime of the store instance.
#[derive(Debug)]
pub struct MemoryObjectStore {
    container: String,
    blobs: DashMap<String, Bytes>,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("resorts")
    }
}

impl MemoryObjectStore {
    /// Create a new, empty store for the given container name.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            blobs: DashMap::new(),
        }
    }

    /// Number of stored binaries.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Returns `true` if nothing has been uploaded.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    fn address_for(&self, name: &str) -> String {
        format!("{SCHEME}{}/{name}", self.container)
    }

    fn name_from<'a>(&self, address: &'a str) -> Result<&'a str, BlobError> {
        address
            .strip_prefix(SCHEME)
            .and_then(|rest| rest.strip_prefix(self.container.as_str()))
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BlobError::InvalidAddress(address.to_owned()))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, name: &str, data: Bytes) -> Result<String, BlobError> {
        if name.is_empty() {
            return Err(BlobError::Rejected("blob name must not be empty".to_owned()));
        }
        debug!(container = %self.container, blob_name = %name, size = data.len(), "storing blob in memory");
        self.blobs.insert(name.to_owned(), data);
        Ok(self.address_for(name))
    }

    async fn download(&self, address: &str) -> Result<Bytes, BlobError> {
        let name = self.name_from(address)?;
        self.blobs
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BlobError::NotFound(address.to_owned()))
    }
}
