use std::sync::Arc;

use azure_core::credentials::{Secret, TokenCredential};
use tracing::{debug, info};

use resorts_blob::BlobError;

use crate::config::AzureBaseConfig;
use crate::connection::ConnectionString;
use crate::shared_key::SharedKey;

/// How blob requests are authenticated.
#[derive(Clone)]
pub enum BlobCredential {
    /// Sign each request with the storage account key.
    SharedKey(SharedKey),
    /// Send an Entra ID bearer token.
    Token(Arc<dyn TokenCredential>),
}

impl std::fmt::Debug for BlobCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SharedKey(key) => f.debug_tuple("SharedKey").field(key).finish(),
            Self::Token(_) => f.write_str("Token"),
        }
    }
}

/// Pick the credential for blob requests.
///
/// An `AccountKey` in the connection string wins, since the connection string
/// is what identifies the account. Without one, a fully configured service
/// principal is used, and the Azure CLI login otherwise.
pub fn resolve_blob_credential(
    connection: Option<&ConnectionString>,
    azure: &AzureBaseConfig,
) -> Result<BlobCredential, BlobError> {
    if let Some(cs) = connection
        && let Some(account_key) = &cs.account_key
    {
        let account = cs.account_name.as_deref().ok_or_else(|| {
            BlobError::Configuration(
                "connection string has an AccountKey but no AccountName".to_owned(),
            )
        })?;
        info!(account = %account, "using shared key credentials for blob storage");
        return SharedKey::new(account, account_key).map(BlobCredential::SharedKey);
    }

    token_credential(azure).map(BlobCredential::Token)
}

fn token_credential(azure: &AzureBaseConfig) -> Result<Arc<dyn TokenCredential>, BlobError> {
    let Some(principal) = azure.service_principal() else {
        info!("using AzureCliCredential for blob storage");
        let credential = azure_identity::AzureCliCredential::new(None).map_err(credential_error)?;
        return Ok(credential);
    };

    info!("using service-principal credentials for blob storage");
    debug!(tenant_id = %principal.tenant_id, "building ClientSecretCredential");
    let credential = azure_identity::ClientSecretCredential::new(
        principal.tenant_id,
        principal.client_id.to_owned(),
        Secret::new(principal.client_credential.to_owned()),
        None,
    )
    .map_err(credential_error)?;
    Ok(credential)
}

fn credential_error(e: azure_core::Error) -> BlobError {
    BlobError::Configuration(format!("credential error: {e}"))
}
