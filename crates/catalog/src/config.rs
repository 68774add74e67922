use serde::{Deserialize, Serialize};

fn default_transfer_concurrency() -> usize {
    1
}

fn default_fallback_content_type() -> String {
    "image/png".to_owned()
}

/// Tuning for entity-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Maximum uploads or downloads in flight for one entity. `1` keeps
    /// per-item transfers strictly sequential.
    #[serde(default = "default_transfer_concurrency")]
    pub transfer_concurrency: usize,

    /// MIME type used for a resolved image whose attachment record carries
    /// no content type.
    #[serde(default = "default_fallback_content_type")]
    pub fallback_content_type: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            transfer_concurrency: default_transfer_concurrency(),
            fallback_content_type: default_fallback_content_type(),
        }
    }
}

impl CatalogConfig {
    /// Set the per-entity transfer concurrency (clamped to at least 1).
    #[must_use]
    pub fn with_transfer_concurrency(mut self, concurrency: usize) -> Self {
        self.transfer_concurrency = concurrency.max(1);
        self
    }

    /// Set the fallback content type for resolved images.
    #[must_use]
    pub fn with_fallback_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.fallback_content_type = content_type.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential_png() {
        let config = CatalogConfig::default();
        assert_eq!(config.transfer_concurrency, 1);
        assert_eq!(config.fallback_content_type, "image/png");

        let parsed: CatalogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn concurrency_is_clamped() {
        let config = CatalogConfig::default().with_transfer_concurrency(0);
        assert_eq!(config.transfer_concurrency, 1);
        let config = CatalogConfig::default()
            .with_transfer_concurrency(4)
            .with_fallback_content_type("image/webp");
        assert_eq!(config.transfer_concurrency, 4);
        assert_eq!(config.fallback_content_type, "image/webp");
    }
}
