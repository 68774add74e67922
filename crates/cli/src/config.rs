use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use resorts_azure::{AzureBlobConfig, AzureBlobStore};
use resorts_blob::ObjectStore;
use resorts_blob_memory::MemoryObjectStore;
use resorts_catalog::{Catalog, CatalogConfig};
use resorts_core::ResortDocument;
use resorts_document::DocumentStore;
use resorts_document_cosmos::{CosmosConfig, CosmosDocumentStore};
use resorts_document_memory::MemoryDocumentStore;

/// Which pair of stores the catalog runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process stores; contents last for one invocation.
    #[default]
    Memory,
    /// Azure Blob Storage plus Cosmos DB.
    Azure,
}

/// Top-level configuration loaded from `resorts.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct ResortsConfig {
    /// Store selection.
    #[serde(default)]
    pub backend: Backend,

    /// Object store settings, used by the `azure` backend.
    #[serde(default)]
    pub blob: AzureBlobConfig,

    /// Document store settings, required by the `azure` backend.
    #[serde(default)]
    pub cosmos: Option<CosmosConfig>,

    /// Entity-level tuning.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl ResortsConfig {
    /// Load the configuration file, or defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Construct the stores and wrap them in a catalog.
    pub async fn build_catalog(&self) -> anyhow::Result<Catalog<ResortDocument>> {
        let (documents, objects): (Arc<dyn DocumentStore<ResortDocument>>, Arc<dyn ObjectStore>) =
            match self.backend {
                Backend::Memory => {
                    warn!("using in-memory stores; nothing is persisted past this command");
                    (
                        Arc::new(MemoryDocumentStore::<ResortDocument>::default()),
                        Arc::new(MemoryObjectStore::default()),
                    )
                }
                Backend::Azure => {
                    let cosmos = self
                        .cosmos
                        .as_ref()
                        .context("backend = \"azure\" requires a [cosmos] section")?;
                    let documents = CosmosDocumentStore::<ResortDocument>::new(cosmos)
                        .await
                        .context("failed to connect to Cosmos DB")?;
                    let objects = AzureBlobStore::new(self.blob.clone())
                        .context("failed to configure Azure Blob Storage")?;
                    info!(
                        database = %cosmos.database,
                        collection = %cosmos.collection,
                        container = %self.blob.container_name,
                        "connected to Azure stores"
                    );
                    (Arc::new(documents), Arc::new(objects))
                }
            };
        Ok(Catalog::new(documents, objects, self.catalog.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_yields_memory_defaults() {
        let config = ResortsConfig::load(Path::new("/nonexistent/resorts.toml")).unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert!(config.cosmos.is_none());
        assert_eq!(config.catalog, CatalogConfig::default());
        assert_eq!(config.blob.container_name, "resorts");
    }

    #[test]
    fn parses_full_azure_config() {
        let toml = r#"
            backend = "azure"

            [blob]
            connection_string = "DefaultEndpointsProtocol=https;AccountName=photos;AccountKey=a2V5;EndpointSuffix=core.windows.net"
            container_name = "images"
            public_access = false

            [cosmos]
            endpoint = "https://acct.documents.azure.com:443/"
            key = "a2V5"
            database = "catalog"
            collection = "resorts"
            page_size = 50

            [catalog]
            transfer_concurrency = 4
        "#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = ResortsConfig::load(file.path()).unwrap();
        assert_eq!(config.backend, Backend::Azure);
        assert_eq!(config.blob.container_name, "images");
        assert!(!config.blob.public_access);
        assert_eq!(
            config.blob.endpoint().unwrap(),
            "https://photos.blob.core.windows.net"
        );

        let cosmos = config.cosmos.unwrap();
        assert_eq!(cosmos.database, "catalog");
        assert_eq!(cosmos.page_size, Some(50));
        assert_eq!(cosmos.throughput, 1000);

        assert_eq!(config.catalog.transfer_concurrency, 4);
        assert_eq!(config.catalog.fallback_content_type, "image/png");
    }

    #[test]
    fn rejects_unknown_backend() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"backend = \"s3\"\n").unwrap();
        assert!(ResortsConfig::load(file.path()).is_err());
    }

    #[tokio::test]
    async fn azure_backend_requires_cosmos_section() {
        let config = ResortsConfig {
            backend: Backend::Azure,
            ..ResortsConfig::default()
        };
        let err = config.build_catalog().await.err().unwrap();
        assert!(err.to_string().contains("[cosmos]"));
    }

    #[tokio::test]
    async fn memory_backend_builds() {
        let catalog = ResortsConfig::default().build_catalog().await.unwrap();
        assert_eq!(catalog.config().transfer_concurrency, 1);
    }
}
