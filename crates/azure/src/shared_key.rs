use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Method, StatusCode, Url};
use sha2::Sha256;
use tracing::debug;

use resorts_blob::BlobError;

use crate::error::{classify_status, is_already_exists};

type HmacSha256 = Hmac<Sha256>;

/// Storage service version sent with every Shared Key request.
pub const STORAGE_VERSION: &str = "2021-08-06";

/// Format a timestamp the way the `x-ms-date` header expects (RFC 1123).
pub fn rfc1123(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The parts of a blob request covered by a Shared Key signature.
#[derive(Debug, Clone, Copy)]
pub struct SignedParts<'a> {
    pub method: &'a str,
    pub content_length: u64,
    pub content_type: &'a str,
    /// Every `x-ms-*` header sent with the request.
    pub ms_headers: &'a [(&'a str, &'a str)],
    /// Request path, percent-encoded as sent.
    pub path: &'a str,
    pub query: &'a [(&'a str, &'a str)],
}

/// Storage account key signer.
#[derive(Clone)]
pub struct SharedKey {
    account: String,
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKey")
            .field("account", &self.account)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SharedKey {
    /// Decode a base64 account key.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Configuration`] for an empty or malformed key.
    pub fn new(account: impl Into<String>, encoded_key: &str) -> Result<Self, BlobError> {
        let key = STANDARD
            .decode(encoded_key.trim())
            .map_err(|e| BlobError::Configuration(format!("invalid storage account key: {e}")))?;
        if key.is_empty() {
            return Err(BlobError::Configuration(
                "storage account key is empty".to_owned(),
            ));
        }
        Ok(Self {
            account: account.into(),
            key,
        })
    }

    /// The storage account the key belongs to.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Build the string a Shared Key signature is computed over.
    pub fn string_to_sign(&self, parts: &SignedParts<'_>) -> String {
        // A zero length is signed as an empty string.
        let content_length = if parts.content_length == 0 {
            String::new()
        } else {
            parts.content_length.to_string()
        };

        let mut headers: Vec<(String, &str)> = parts
            .ms_headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.trim()))
            .collect();
        headers.sort();

        let mut query: Vec<(String, &str)> = parts
            .query
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), *value))
            .collect();
        query.sort();

        let mut out = format!(
            "{}\n\n\n{content_length}\n\n{}\n\n\n\n\n\n\n",
            parts.method, parts.content_type
        );
        for (name, value) in headers {
            out.push_str(&format!("{name}:{value}\n"));
        }
        out.push_str(&format!("/{}{}", self.account, parts.path));
        for (name, value) in query {
            out.push_str(&format!("\n{name}:{value}"));
        }
        out
    }

    /// Build the `Authorization` header value for a request.
    pub fn authorization(&self, parts: &SignedParts<'_>) -> Result<String, BlobError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| BlobError::Configuration(format!("invalid HMAC key: {e}")))?;
        mac.update(self.string_to_sign(parts).as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        Ok(format!("SharedKey {}:{signature}", self.account))
    }
}

/// Blob REST client that authenticates with the storage account key.
#[derive(Debug, Clone)]
pub struct SharedKeyClient {
    http: reqwest::Client,
    key: SharedKey,
}

impl SharedKeyClient {
    pub fn new(http: reqwest::Client, key: SharedKey) -> Self {
        Self { http, key }
    }

    /// Create a container. Returns `false` if it already existed.
    pub async fn create_container(
        &self,
        endpoint: &str,
        container: &str,
        public_access: bool,
    ) -> Result<bool, BlobError> {
        let url = parse_url(&format!("{endpoint}/{container}?restype=container"))?;
        let mut extra = Vec::new();
        if public_access {
            extra.push(("x-ms-blob-public-access", "container"));
        }
        let response = self
            .send(Method::PUT, url, &extra, None, container)
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        let code = error_code(&response);
        if is_already_exists(status.as_u16(), code.as_deref()) {
            return Ok(false);
        }
        Err(failure(response, container).await)
    }

    /// Upload a block blob to `address`, overwriting any existing blob.
    pub async fn put_blob(&self, address: &str, data: Bytes) -> Result<(), BlobError> {
        let url = parse_url(address)?;
        let response = self
            .send(
                Method::PUT,
                url,
                &[("x-ms-blob-type", "BlockBlob")],
                Some(data),
                address,
            )
            .await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(failure(response, address).await)
    }

    /// Download the blob at `address`.
    pub async fn get_blob(&self, address: &str) -> Result<Bytes, BlobError> {
        let url = parse_url(address)?;
        let response = self.send(Method::GET, url, &[], None, address).await?;
        if !response.status().is_success() {
            return Err(failure(response, address).await);
        }
        response
            .bytes()
            .await
            .map_err(|e| BlobError::Unavailable(format!("failed to read blob body: {e}")))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        extra_headers: &[(&str, &str)],
        body: Option<Bytes>,
        target: &str,
    ) -> Result<reqwest::Response, BlobError> {
        let date = rfc1123(Utc::now());
        let mut ms_headers = vec![("x-ms-date", date.as_str()), ("x-ms-version", STORAGE_VERSION)];
        ms_headers.extend_from_slice(extra_headers);

        let content_length = body.as_ref().map_or(0, |b| b.len() as u64);
        let content_type = if body.is_some() {
            "application/octet-stream"
        } else {
            ""
        };
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let query_refs: Vec<(&str, &str)> = query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let authorization = self.key.authorization(&SignedParts {
            method: method.as_str(),
            content_length,
            content_type,
            ms_headers: &ms_headers,
            path: url.path(),
            query: &query_refs,
        })?;

        let mut request = self
            .http
            .request(method, url)
            .header("Authorization", authorization);
        for (name, value) in &ms_headers {
            request = request.header(*name, *value);
        }
        request = match body {
            Some(data) => request.header("Content-Type", content_type).body(data),
            None => request.header("Content-Length", "0"),
        };

        request.send().await.map_err(|e| {
            debug!(target = %target, error = %e, "blob request failed to send");
            BlobError::Unavailable(format!("blob request failed: {e}"))
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, BlobError> {
    Url::parse(raw).map_err(|_| BlobError::InvalidAddress(raw.to_owned()))
}

fn error_code(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn failure(response: reqwest::Response, target: &str) -> BlobError {
    let status: StatusCode = response.status();
    let code = error_code(&response);
    let body = response.text().await.unwrap_or_default();
    let message = match &code {
        Some(code) => format!("HTTP {}: {code}", status.as_u16()),
        None if body.is_empty() => format!("HTTP {}", status.as_u16()),
        None => format!("HTTP {}: {body}", status.as_u16()),
    };
    classify_status(status.as_u16(), code.as_deref(), &message, target)
}
