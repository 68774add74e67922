use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::Sha256;

use resorts_document::DocumentError;

type HmacSha256 = Hmac<Sha256>;

/// Characters escaped in the `authorization` header value.
const AUTH_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Format a timestamp the way the `x-ms-date` header expects (RFC 1123).
pub fn rfc1123(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Master-key signer for Cosmos DB REST requests.
#[derive(Clone)]
pub struct MasterKey {
    key: Vec<u8>,
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey").field("key", &"[REDACTED]").finish()
    }
}

impl MasterKey {
    /// Decode a base64 account key.
    pub fn from_base64(encoded: &str) -> Result<Self, DocumentError> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DocumentError::Configuration(format!("invalid Cosmos master key: {e}")))?;
        if key.is_empty() {
            return Err(DocumentError::Configuration(
                "Cosmos master key is empty".to_owned(),
            ));
        }
        Ok(Self { key })
    }

    /// Build the percent-encoded `authorization` header value for a request.
    ///
    /// `resource_link` is used as given; callers lowercase rid-based links.
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> Result<String, DocumentError> {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| DocumentError::Configuration(format!("invalid HMAC key: {e}")))?;
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());
        let token = format!("type=master&ver=1.0&sig={signature}");
        Ok(utf8_percent_encode(&token, AUTH_VALUE).to_string())
    }
}
