use resorts_blob::BlobError;

/// The parts of an Azure Storage connection string used to locate the blob
/// endpoint and authenticate against it.
///
/// Connection strings are `;`-separated `Key=Value` pairs such as
/// `DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=...;EndpointSuffix=core.windows.net`.
/// `UseDevelopmentStorage=true` resolves to the local `Azurite` emulator.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionString {
    /// `AccountName`.
    pub account_name: Option<String>,
    /// `AccountKey`. Redacted in `Debug`.
    pub account_key: Option<String>,
    /// `DefaultEndpointsProtocol`.
    pub protocol: Option<String>,
    /// `EndpointSuffix`.
    pub endpoint_suffix: Option<String>,
    /// `BlobEndpoint`.
    pub blob_endpoint: Option<String>,
}

impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name)
            .field("account_key", &self.account_key.as_ref().map(|_| "[REDACTED]"))
            .field("protocol", &self.protocol)
            .field("endpoint_suffix", &self.endpoint_suffix)
            .field("blob_endpoint", &self.blob_endpoint)
            .finish()
    }
}

const DEV_STORAGE_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";
const DEV_STORAGE_ACCOUNT: &str = "devstoreaccount1";
/// Published account key of the local storage emulator.
const DEV_STORAGE_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

impl ConnectionString {
    /// Parse a connection string. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Configuration`] for a segment without `=`.
    pub fn parse(raw: &str) -> Result<Self, BlobError> {
        let mut parsed = Self::default();
        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                BlobError::Configuration(format!("malformed connection string segment '{segment}'"))
            })?;
            let value = value.to_owned();
            match key.to_ascii_lowercase().as_str() {
                "accountname" => parsed.account_name = Some(value),
                "accountkey" => parsed.account_key = Some(value),
                "defaultendpointsprotocol" => parsed.protocol = Some(value),
                "endpointsuffix" => parsed.endpoint_suffix = Some(value),
                "blobendpoint" => parsed.blob_endpoint = Some(value),
                "usedevelopmentstorage" if value.eq_ignore_ascii_case("true") => {
                    parsed.blob_endpoint = Some(DEV_STORAGE_ENDPOINT.to_owned());
                    parsed.account_name = Some(DEV_STORAGE_ACCOUNT.to_owned());
                    parsed.account_key = Some(DEV_STORAGE_KEY.to_owned());
                }
                _ => {}
            }
        }
        Ok(parsed)
    }

    /// Resolve the blob service endpoint, without a trailing slash.
    ///
    /// An explicit `BlobEndpoint` wins; otherwise the endpoint is built from
    /// the protocol (default `https`), account name, and suffix (default
    /// `core.windows.net`).
    pub fn blob_endpoint(&self) -> Option<String> {
        if let Some(endpoint) = &self.blob_endpoint {
            return Some(endpoint.trim_end_matches('/').to_owned());
        }
        let account = self.account_name.as_deref()?;
        let protocol = self.protocol.as_deref().unwrap_or("https");
        let suffix = self.endpoint_suffix.as_deref().unwrap_or("core.windows.net");
        Some(format!("{protocol}://{account}.blob.{suffix}"))
    }
}
