use serde::{Deserialize, Serialize};

/// Shared Azure identity settings.
///
/// Holds optional service principal credentials and an optional endpoint
/// override for local development (e.g. `Azurite`).
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AzureBaseConfig {
    /// Azure AD tenant ID.
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Azure AD application (client) ID.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Azure AD client credential (service principal). Redacted in `Debug`.
    #[serde(default)]
    pub client_credential: Option<String>,

    /// Optional endpoint URL override for local development (e.g. `Azurite`).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for AzureBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureBaseConfig")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id.as_ref().map(|_| "[REDACTED]"))
            .field(
                "client_credential",
                &self.client_credential.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl AzureBaseConfig {
    /// Set the Azure AD tenant ID.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the Azure AD application (client) ID.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the Azure AD client credential.
    #[must_use]
    pub fn with_client_credential(mut self, client_credential: impl Into<String>) -> Self {
        self.client_credential = Some(client_credential.into());
        self
    }

    /// Set the endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// The service principal, when all three of its fields are set.
    pub fn service_principal(&self) -> Option<ServicePrincipal<'_>> {
        Some(ServicePrincipal {
            tenant_id: self.tenant_id.as_deref()?,
            client_id: self.client_id.as_deref()?,
            client_credential: self.client_credential.as_deref()?,
        })
    }
}

/// Borrowed service principal settings from an [`AzureBaseConfig`].
#[derive(Clone, Copy)]
pub struct ServicePrincipal<'a> {
    pub tenant_id: &'a str,
    pub client_id: &'a str,
    pub client_credential: &'a str,
}
