use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_database() -> String {
    "resorts".to_owned()
}

fn default_collection() -> String {
    "resorts".to_owned()
}

fn default_throughput() -> u32 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

/// Configuration for the Cosmos DB document store.
#[derive(Clone, Serialize, Deserialize)]
pub struct CosmosConfig {
    /// Account endpoint, e.g. `https://myaccount.documents.azure.com:443/`.
    pub endpoint: String,

    /// Base64-encoded account master key. Redacted in `Debug`.
    pub key: String,

    /// Database holding the collection.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding the documents.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Offer throughput used when provisioning the collection.
    #[serde(default = "default_throughput")]
    pub throughput: u32,

    /// Maximum number of documents per listing page. The service default
    /// applies when unset.
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for CosmosConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CosmosConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"[REDACTED]")
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("throughput", &self.throughput)
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl CosmosConfig {
    /// Create a config for the given account endpoint and master key.
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            database: default_database(),
            collection: default_collection(),
            throughput: default_throughput(),
            page_size: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Set the database name.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the collection name.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the provisioning throughput.
    #[must_use]
    pub fn with_throughput(mut self, throughput: u32) -> Self {
        self.throughput = throughput;
        self
    }

    /// Set the maximum number of documents per listing page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The endpoint without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}
