use std::sync::Arc;

use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_storage_blob::models::{BlobContainerClientCreateOptions, PublicAccessType};
use azure_storage_blob::{BlobClient, BlobContainerClient, BlobServiceClient};
use bytes::Bytes;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, instrument};

use resorts_blob::{BlobError, ObjectStore};

use crate::auth::{BlobCredential, resolve_blob_credential};
use crate::config::AzureBaseConfig;
use crate::connection::ConnectionString;
use crate::error::{classify_azure_error, sdk_already_exists};
use crate::shared_key::SharedKeyClient;

/// Characters escaped when a blob name is placed in an address.
const BLOB_NAME: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn default_container_name() -> String {
    "resorts".to_owned()
}

fn default_public_access() -> bool {
    true
}

/// Configuration for the Azure Blob Storage object store.
#[derive(Clone, Serialize, Deserialize)]
pub struct AzureBlobConfig {
    /// Shared Azure identity settings.
    #[serde(flatten)]
    pub azure: AzureBaseConfig,

    /// Storage connection string. Locates the blob endpoint and, when it
    /// carries an `AccountKey`, authenticates requests.
    #[serde(default)]
    pub connection_string: Option<String>,

    /// Azure Storage account name, when no connection string is given.
    #[serde(default)]
    pub account_name: Option<String>,

    /// Container holding every uploaded binary.
    #[serde(default = "default_container_name")]
    pub container_name: String,

    /// Create the container with public read access.
    #[serde(default = "default_public_access")]
    pub public_access: bool,
}

impl std::fmt::Debug for AzureBlobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBlobConfig")
            .field("azure", &self.azure)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .field("account_name", &self.account_name)
            .field("container_name", &self.container_name)
            .field("public_access", &self.public_access)
            .finish()
    }
}

impl Default for AzureBlobConfig {
    fn default() -> Self {
        Self {
            azure: AzureBaseConfig::default(),
            connection_string: None,
            account_name: None,
            container_name: default_container_name(),
            public_access: default_public_access(),
        }
    }
}

impl AzureBlobConfig {
    /// Create a config for the given container.
    pub fn new(container_name: impl Into<String>) -> Self {
        Self {
            container_name: container_name.into(),
            ..Self::default()
        }
    }

    /// Set the storage connection string.
    #[must_use]
    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    /// Set the storage account name.
    #[must_use]
    pub fn with_account_name(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = Some(account_name.into());
        self
    }

    /// Set the endpoint URL override (for `Azurite`).
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.azure.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set whether the container is created with public read access.
    #[must_use]
    pub fn with_public_access(mut self, public_access: bool) -> Self {
        self.public_access = public_access;
        self
    }

    /// Resolve the blob service endpoint.
    ///
    /// Precedence: explicit endpoint override, then the connection string,
    /// then the account name.
    pub fn endpoint(&self) -> Result<String, BlobError> {
        if let Some(endpoint) = &self.azure.endpoint_url {
            return Ok(endpoint.trim_end_matches('/').to_owned());
        }
        if let Some(raw) = &self.connection_string
            && let Some(endpoint) = ConnectionString::parse(raw)?.blob_endpoint()
        {
            return Ok(endpoint);
        }
        self.account_name
            .as_deref()
            .map(|account| format!("https://{account}.blob.core.windows.net"))
            .ok_or_else(|| {
                BlobError::Configuration(
                    "azure blob: connection_string, account_name or endpoint_url is required"
                        .to_owned(),
                )
            })
    }
}

/// Build the durable address of a blob.
pub fn blob_address(endpoint: &str, container: &str, blob_name: &str) -> String {
    format!(
        "{endpoint}/{container}/{}",
        utf8_percent_encode(blob_name, BLOB_NAME)
    )
}

/// Split an address produced by [`blob_address`] back into container and
/// blob name.
pub fn parse_blob_address(endpoint: &str, address: &str) -> Result<(String, String), BlobError> {
    let invalid = || BlobError::InvalidAddress(address.to_owned());
    let rest = address
        .strip_prefix(endpoint)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(invalid)?;
    let (container, encoded) = rest.split_once('/').ok_or_else(invalid)?;
    if container.is_empty() || encoded.is_empty() {
        return Err(invalid());
    }
    let blob_name = percent_decode_str(encoded)
        .decode_utf8()
        .map_err(|_| invalid())?
        .into_owned();
    Ok((container.to_owned(), blob_name))
}

/// How requests reach the blob service.
enum Transport {
    /// The Azure SDK client, authenticated with an Entra ID token.
    Sdk {
        service_client: BlobServiceClient,
        credential: Arc<dyn TokenCredential>,
    },
    /// Signed REST calls using the storage account key.
    SharedKey(SharedKeyClient),
}

/// Azure Blob Storage [`ObjectStore`].
///
/// The client handles are built once and reused for every request.
pub struct AzureBlobStore {
    config: AzureBlobConfig,
    transport: Transport,
    endpoint: String,
    container_ready: OnceCell<()>,
}

impl std::fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match self.transport {
            Transport::Sdk { .. } => "token",
            Transport::SharedKey(_) => "shared_key",
        };
        f.debug_struct("AzureBlobStore")
            .field("config", &self.config)
            .field("endpoint", &self.endpoint)
            .field("transport", &transport)
            .finish_non_exhaustive()
    }
}

impl AzureBlobStore {
    /// Create a new store by building an Azure Blob Storage client.
    ///
    /// An `AccountKey` in the connection string selects Shared Key signing;
    /// otherwise requests carry an Entra ID token. No request is made until
    /// the first upload or download.
    pub fn new(config: AzureBlobConfig) -> Result<Self, BlobError> {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Create a new store using the given HTTP client for Shared Key requests.
    pub fn with_http_client(
        config: AzureBlobConfig,
        http: reqwest::Client,
    ) -> Result<Self, BlobError> {
        let endpoint = config.endpoint()?;
        let connection = config
            .connection_string
            .as_deref()
            .map(ConnectionString::parse)
            .transpose()?;

        let transport = match resolve_blob_credential(connection.as_ref(), &config.azure)? {
            BlobCredential::SharedKey(key) => Transport::SharedKey(SharedKeyClient::new(http, key)),
            BlobCredential::Token(credential) => {
                let service_client =
                    BlobServiceClient::new(&endpoint, Some(Arc::clone(&credential)), None)
                        .map_err(|e| BlobError::Configuration(format!("blob client error: {e}")))?;
                Transport::Sdk {
                    service_client,
                    credential,
                }
            }
        };

        Ok(Self {
            config,
            transport,
            endpoint,
            container_ready: OnceCell::new(),
        })
    }

    /// The blob service endpoint this store talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Make sure the container exists, creating it on the first call.
    async fn ensure_container(&self) -> Result<(), BlobError> {
        self.container_ready
            .get_or_try_init(|| self.create_container_if_missing())
            .await
            .map(|_| ())
    }

    async fn create_container_if_missing(&self) -> Result<(), BlobError> {
        let container = self.config.container_name.as_str();
        let created = match &self.transport {
            Transport::SharedKey(client) => {
                client
                    .create_container(&self.endpoint, container, self.config.public_access)
                    .await
            }
            Transport::Sdk { credential, .. } => {
                self.create_container_with_sdk(container, credential).await
            }
        };

        match created {
            Ok(true) => {
                info!(container = %container, "blob container created");
                Ok(())
            }
            Ok(false) => {
                debug!(container = %container, "blob container already exists");
                Ok(())
            }
            Err(e) => {
                error!(container = %container, error = %e, "blob container creation failed");
                Err(e)
            }
        }
    }

    async fn create_container_with_sdk(
        &self,
        container: &str,
        credential: &Arc<dyn TokenCredential>,
    ) -> Result<bool, BlobError> {
        let client = BlobContainerClient::new(
            &self.endpoint,
            container,
            Some(Arc::clone(credential)),
            None,
        )
        .map_err(|e| BlobError::Configuration(format!("container client error: {e}")))?;

        let options = BlobContainerClientCreateOptions {
            access: self.config.public_access.then_some(PublicAccessType::Container),
            ..Default::default()
        };

        match client.create(Some(options)).await {
            Ok(_) => Ok(true),
            Err(e) if sdk_already_exists(&e) => Ok(false),
            Err(e) => Err(classify_azure_error(&e, container)),
        }
    }
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    #[instrument(skip(self, data), fields(container = %self.config.container_name, blob_name = %name))]
    async fn upload(&self, name: &str, data: Bytes) -> Result<String, BlobError> {
        self.ensure_container().await?;

        let container = self.config.container_name.as_str();
        let address = blob_address(&self.endpoint, container, name);
        let content_length = data.len() as u64;
        debug!(size = content_length, "uploading blob");

        let uploaded = match &self.transport {
            Transport::SharedKey(client) => client.put_blob(&address, data).await,
            Transport::Sdk { service_client, .. } => {
                let blob_client = service_client.blob_client(container, name);
                let body: azure_core::Bytes = data.to_vec().into();
                blob_client
                    .upload(body.into(), true, content_length, None)
                    .await
                    .map(|_| ())
                    .map_err(|e| classify_azure_error(&e, name))
            }
        };
        if let Err(e) = uploaded {
            error!(error = %e, "blob upload failed");
            return Err(e);
        }

        info!(address = %address, "blob uploaded");
        Ok(address)
    }

    #[instrument(skip(self))]
    async fn download(&self, address: &str) -> Result<Bytes, BlobError> {
        let (container, blob_name) = parse_blob_address(&self.endpoint, address)?;
        debug!(container = %container, blob_name = %blob_name, "downloading blob");

        let downloaded = match &self.transport {
            Transport::SharedKey(client) => client.get_blob(address).await,
            Transport::Sdk { credential, .. } => {
                self.download_with_sdk(&container, &blob_name, address, credential)
                    .await
            }
        };
        match downloaded {
            Ok(body) => {
                debug!(size = body.len(), "blob downloaded");
                Ok(body)
            }
            Err(e) => {
                error!(error = %e, "blob download failed");
                Err(e)
            }
        }
    }
}

impl AzureBlobStore {
    async fn download_with_sdk(
        &self,
        container: &str,
        blob_name: &str,
        address: &str,
        credential: &Arc<dyn TokenCredential>,
    ) -> Result<Bytes, BlobError> {
        let blob_client = BlobClient::new(
            &self.endpoint,
            container,
            blob_name,
            Some(Arc::clone(credential)),
            None,
        )
        .map_err(|e| BlobError::Configuration(format!("blob client error: {e}")))?;

        let response = blob_client
            .download(None)
            .await
            .map_err(|e| classify_azure_error(&e, address))?;

        let body: azure_core::Bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| BlobError::Unavailable(format!("failed to read blob body: {e}")))?;
        Ok(Bytes::from(body.to_vec()))
    }
}
